use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};

use super::settings::CampaignSettings;
use crate::common::{AdminUserId, CampaignId};

/// Campaign - a landing page that collects address claims
///
/// The configuration columns mirror the most recently published
/// `CampaignSettings`; `slug` and `is_active` are operational and live
/// outside versioning.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: CampaignId,
    pub slug: String,
    pub title: String,
    pub internal_title: Option<String>,
    pub description: Option<String>,
    pub capacity_total: Option<i32>,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,

    // Feature toggles
    pub require_email: bool,
    pub require_phone: bool,
    pub require_invite_code: bool,
    pub show_scarcity: bool,
    pub test_mode: bool,
    pub kiosk_mode: bool,
    pub allow_international: bool,
    pub success_message: Option<String>,

    pub current_version: Option<i32>,
    pub created_by: Option<AdminUserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campaign row plus claim counts, for admin listings
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CampaignWithCounts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub campaign: Campaign,
    pub claim_count: i64,
    pub counted_claims: i64,
}

impl Campaign {
    pub fn settings(&self) -> CampaignSettings {
        CampaignSettings {
            title: self.title.clone(),
            internal_title: self.internal_title.clone(),
            description: self.description.clone(),
            capacity_total: self.capacity_total,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            require_email: self.require_email,
            require_phone: self.require_phone,
            require_invite_code: self.require_invite_code,
            show_scarcity: self.show_scarcity,
            test_mode: self.test_mode,
            kiosk_mode: self.kiosk_mode,
            allow_international: self.allow_international,
            success_message: self.success_message.clone(),
        }
    }

    pub async fn find_by_id(id: CampaignId, pool: &PgPool) -> Result<Option<Self>> {
        let campaign = sqlx::query_as::<_, Self>("SELECT * FROM campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(campaign)
    }

    pub async fn find_by_slug(slug: &str, pool: &PgPool) -> Result<Option<Self>> {
        let campaign = sqlx::query_as::<_, Self>("SELECT * FROM campaigns WHERE slug = $1")
            .bind(slug.trim().to_lowercase())
            .fetch_optional(pool)
            .await?;
        Ok(campaign)
    }

    /// Lock the campaign row for the rest of the transaction.
    ///
    /// Claim inserts that check capacity take this lock first, which
    /// serializes them per campaign.
    pub async fn lock<'e>(id: CampaignId, db: impl PgExecutor<'e>) -> Result<Option<Self>> {
        let campaign =
            sqlx::query_as::<_, Self>("SELECT * FROM campaigns WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(campaign)
    }

    /// Campaigns an admin can see, newest first
    pub async fn find_visible_to(
        user_id: AdminUserId,
        sees_all: bool,
        pool: &PgPool,
    ) -> Result<Vec<CampaignWithCounts>> {
        let campaigns = sqlx::query_as::<_, CampaignWithCounts>(
            r#"
            SELECT c.*,
                   COUNT(cl.id) AS claim_count,
                   COUNT(cl.id) FILTER (
                       WHERE cl.status <> 'rejected' AND (NOT cl.is_test_claim OR c.test_mode)
                   ) AS counted_claims
            FROM campaigns c
            LEFT JOIN claims cl ON cl.campaign_id = c.id
            WHERE $2
               OR c.created_by = $1
               OR EXISTS (
                   SELECT 1 FROM campaign_members m
                   WHERE m.campaign_id = c.id AND m.user_id = $1
               )
            GROUP BY c.id
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(user_id)
        .bind(sees_all)
        .fetch_all(pool)
        .await?;
        Ok(campaigns)
    }

    /// Insert a campaign whose settings become published version 1
    pub async fn create<'e>(
        slug: &str,
        settings: &CampaignSettings,
        is_active: bool,
        created_by: AdminUserId,
        db: impl PgExecutor<'e>,
    ) -> Result<Self> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO campaigns (
                id, slug, title, internal_title, description, capacity_total,
                is_active, starts_at, ends_at,
                require_email, require_phone, require_invite_code, show_scarcity,
                test_mode, kiosk_mode, allow_international, success_message,
                created_by, current_version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, 1)
            RETURNING *
            "#,
        )
        .bind(CampaignId::new())
        .bind(slug)
        .bind(&settings.title)
        .bind(&settings.internal_title)
        .bind(&settings.description)
        .bind(settings.capacity_total)
        .bind(is_active)
        .bind(settings.starts_at)
        .bind(settings.ends_at)
        .bind(settings.require_email)
        .bind(settings.require_phone)
        .bind(settings.require_invite_code)
        .bind(settings.show_scarcity)
        .bind(settings.test_mode)
        .bind(settings.kiosk_mode)
        .bind(settings.allow_international)
        .bind(&settings.success_message)
        .bind(created_by)
        .fetch_one(db)
        .await?;
        Ok(campaign)
    }

    /// Copy a published snapshot onto the live columns.
    pub async fn apply_settings<'e>(
        id: CampaignId,
        settings: &CampaignSettings,
        version_number: i32,
        db: impl PgExecutor<'e>,
    ) -> Result<Self> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns SET
                title = $2,
                internal_title = $3,
                description = $4,
                capacity_total = $5,
                starts_at = $6,
                ends_at = $7,
                require_email = $8,
                require_phone = $9,
                require_invite_code = $10,
                show_scarcity = $11,
                test_mode = $12,
                kiosk_mode = $13,
                allow_international = $14,
                success_message = $15,
                current_version = $16,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&settings.title)
        .bind(&settings.internal_title)
        .bind(&settings.description)
        .bind(settings.capacity_total)
        .bind(settings.starts_at)
        .bind(settings.ends_at)
        .bind(settings.require_email)
        .bind(settings.require_phone)
        .bind(settings.require_invite_code)
        .bind(settings.show_scarcity)
        .bind(settings.test_mode)
        .bind(settings.kiosk_mode)
        .bind(settings.allow_international)
        .bind(&settings.success_message)
        .bind(version_number)
        .fetch_one(db)
        .await?;
        Ok(campaign)
    }

    pub async fn update_operational(
        id: CampaignId,
        slug: Option<&str>,
        is_active: Option<bool>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns SET
                slug = COALESCE($2, slug),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(slug)
        .bind(is_active)
        .fetch_optional(pool)
        .await?;
        Ok(campaign)
    }

    pub async fn delete<'e>(id: CampaignId, db: impl PgExecutor<'e>) -> Result<bool> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub(crate) fn test_campaign(slug: &str) -> Campaign {
    let now = Utc::now();
    Campaign {
        id: CampaignId::new(),
        slug: slug.to_string(),
        title: "Claim your kin".to_string(),
        internal_title: None,
        description: None,
        capacity_total: None,
        is_active: true,
        starts_at: None,
        ends_at: None,
        require_email: true,
        require_phone: false,
        require_invite_code: false,
        show_scarcity: false,
        test_mode: false,
        kiosk_mode: false,
        allow_international: false,
        success_message: None,
        current_version: Some(1),
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}
