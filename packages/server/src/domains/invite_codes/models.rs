use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};

use crate::common::{AdminUserId, CampaignId, InviteCodeId};

/// Code a visitor must enter on campaigns that require one
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InviteCode {
    pub id: InviteCodeId,
    pub campaign_id: CampaignId,
    pub code: String,
    /// `None` means unlimited
    pub max_uses: Option<i32>,
    pub uses: i32,
    pub is_active: bool,
    pub note: Option<String>,
    pub created_by: Option<AdminUserId>,
    pub created_at: DateTime<Utc>,
}

impl InviteCode {
    pub async fn find_for_campaign(campaign_id: CampaignId, pool: &PgPool) -> Result<Vec<Self>> {
        let codes = sqlx::query_as::<_, Self>(
            "SELECT * FROM invite_codes WHERE campaign_id = $1 ORDER BY created_at DESC, code",
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await?;
        Ok(codes)
    }

    pub async fn find_in_campaign(
        id: InviteCodeId,
        campaign_id: CampaignId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let code =
            sqlx::query_as::<_, Self>("SELECT * FROM invite_codes WHERE id = $1 AND campaign_id = $2")
                .bind(id)
                .bind(campaign_id)
                .fetch_optional(pool)
                .await?;
        Ok(code)
    }

    /// Insert a code; `None` if the campaign already has it
    pub async fn create<'e>(
        campaign_id: CampaignId,
        code: &str,
        max_uses: Option<i32>,
        note: Option<&str>,
        created_by: AdminUserId,
        db: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        let invite = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO invite_codes (id, campaign_id, code, max_uses, note, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (campaign_id, code) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(InviteCodeId::new())
        .bind(campaign_id)
        .bind(code)
        .bind(max_uses)
        .bind(note)
        .bind(created_by)
        .fetch_optional(db)
        .await?;
        Ok(invite)
    }

    pub async fn update(
        id: InviteCodeId,
        campaign_id: CampaignId,
        is_active: Option<bool>,
        max_uses: Option<i32>,
        note: Option<&str>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let invite = sqlx::query_as::<_, Self>(
            r#"
            UPDATE invite_codes SET
                is_active = COALESCE($3, is_active),
                max_uses = COALESCE($4, max_uses),
                note = COALESCE($5, note)
            WHERE id = $1 AND campaign_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(campaign_id)
        .bind(is_active)
        .bind(max_uses)
        .bind(note)
        .fetch_optional(pool)
        .await?;
        Ok(invite)
    }

    /// Delete a code nobody has used yet
    pub async fn delete_unused(id: InviteCodeId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM invite_codes WHERE id = $1 AND uses = 0")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Take one use of a code if it is active and not exhausted.
    ///
    /// The check and the increment are a single statement, so two visitors
    /// racing for the last use cannot both get it.
    pub async fn redeem<'e>(
        campaign_id: CampaignId,
        code: &str,
        db: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        let invite = sqlx::query_as::<_, Self>(
            r#"
            UPDATE invite_codes SET uses = uses + 1
            WHERE campaign_id = $1
              AND code = $2
              AND is_active
              AND (max_uses IS NULL OR uses < max_uses)
            RETURNING *
            "#,
        )
        .bind(campaign_id)
        .bind(code)
        .fetch_optional(db)
        .await?;
        Ok(invite)
    }
}
