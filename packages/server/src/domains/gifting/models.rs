use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::{AdminUserId, CampaignId, GiftCodeId};

/// A persistent per-admin code that personalizes a claim page
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminGiftCode {
    pub id: GiftCodeId,
    pub admin_user_id: AdminUserId,
    pub campaign_id: CampaignId,
    pub code: String,
    pub label: Option<String>,
    pub message: Option<String>,

    // What the recipient may see of the gifter's profile
    pub show_name: bool,
    pub show_email: bool,
    pub show_phone: bool,
    pub show_bio: bool,
    pub show_avatar: bool,
    pub show_website: bool,

    pub is_active: bool,
    pub uses: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Disclosure flags; omitted flags keep their current (or default) value
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DisclosureInput {
    pub show_name: Option<bool>,
    pub show_email: Option<bool>,
    pub show_phone: Option<bool>,
    pub show_bio: Option<bool>,
    pub show_avatar: Option<bool>,
    pub show_website: Option<bool>,
}

impl AdminGiftCode {
    pub async fn find_by_id(id: GiftCodeId, pool: &PgPool) -> Result<Option<Self>> {
        let gift = sqlx::query_as::<_, Self>("SELECT * FROM admin_gift_codes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(gift)
    }

    pub async fn find_active_by_code(code: &str, pool: &PgPool) -> Result<Option<Self>> {
        let gift = sqlx::query_as::<_, Self>(
            "SELECT * FROM admin_gift_codes WHERE code = $1 AND is_active",
        )
        .bind(code)
        .fetch_optional(pool)
        .await?;
        Ok(gift)
    }

    /// Codes owned by `admin_user_id`, or every code when `all`
    pub async fn find_for_admin(
        admin_user_id: AdminUserId,
        all: bool,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let gifts = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM admin_gift_codes
            WHERE $2 OR admin_user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(admin_user_id)
        .bind(all)
        .fetch_all(pool)
        .await?;
        Ok(gifts)
    }

    /// Insert a code; `None` if it is already taken
    pub async fn create(
        admin_user_id: AdminUserId,
        campaign_id: CampaignId,
        code: &str,
        label: Option<&str>,
        message: Option<&str>,
        flags: DisclosureInput,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let gift = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO admin_gift_codes (
                id, admin_user_id, campaign_id, code, label, message,
                show_name, show_email, show_phone, show_bio, show_avatar, show_website
            )
            VALUES (
                $1, $2, $3, $4, $5, $6,
                COALESCE($7, true), COALESCE($8, false), COALESCE($9, false),
                COALESCE($10, true), COALESCE($11, true), COALESCE($12, false)
            )
            ON CONFLICT (code) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(GiftCodeId::new())
        .bind(admin_user_id)
        .bind(campaign_id)
        .bind(code)
        .bind(label)
        .bind(message)
        .bind(flags.show_name)
        .bind(flags.show_email)
        .bind(flags.show_phone)
        .bind(flags.show_bio)
        .bind(flags.show_avatar)
        .bind(flags.show_website)
        .fetch_optional(pool)
        .await?;
        Ok(gift)
    }

    pub async fn update(
        id: GiftCodeId,
        label: Option<&str>,
        message: Option<&str>,
        is_active: Option<bool>,
        flags: DisclosureInput,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let gift = sqlx::query_as::<_, Self>(
            r#"
            UPDATE admin_gift_codes SET
                label = COALESCE($2, label),
                message = COALESCE($3, message),
                is_active = COALESCE($4, is_active),
                show_name = COALESCE($5, show_name),
                show_email = COALESCE($6, show_email),
                show_phone = COALESCE($7, show_phone),
                show_bio = COALESCE($8, show_bio),
                show_avatar = COALESCE($9, show_avatar),
                show_website = COALESCE($10, show_website),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(label)
        .bind(message)
        .bind(is_active)
        .bind(flags.show_name)
        .bind(flags.show_email)
        .bind(flags.show_phone)
        .bind(flags.show_bio)
        .bind(flags.show_avatar)
        .bind(flags.show_website)
        .fetch_optional(pool)
        .await?;
        Ok(gift)
    }

    pub async fn delete(id: GiftCodeId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM admin_gift_codes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count one claim against an active code; `false` if it was switched off
    pub async fn record_use<'e>(id: GiftCodeId, db: impl PgExecutor<'e>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE admin_gift_codes SET uses = uses + 1, updated_at = NOW() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
