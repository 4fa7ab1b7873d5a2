use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};

use crate::common::{AdminUserId, CampaignId, GlobalRole, MemberRole};

/// Per-campaign access grant, separate from the global admin role
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CampaignMember {
    pub campaign_id: CampaignId,
    pub user_id: AdminUserId,
    pub role: MemberRole,
    pub added_by: Option<AdminUserId>,
    pub created_at: DateTime<Utc>,
}

/// Membership joined with the admin user it belongs to
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MemberWithUser {
    pub campaign_id: CampaignId,
    pub user_id: AdminUserId,
    pub role: MemberRole,
    pub email: String,
    pub display_name: String,
    pub global_role: GlobalRole,
    pub created_at: DateTime<Utc>,
}

/// What the permission layer needs to know about one actor on one campaign
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignAccess {
    pub created_by: Option<AdminUserId>,
    pub membership: Option<MemberRole>,
}

impl CampaignMember {
    /// `None` when the campaign does not exist
    pub async fn access(
        campaign_id: CampaignId,
        user_id: AdminUserId,
        pool: &PgPool,
    ) -> Result<Option<CampaignAccess>> {
        let access = sqlx::query_as::<_, CampaignAccess>(
            r#"
            SELECT c.created_by, m.role AS membership
            FROM campaigns c
            LEFT JOIN campaign_members m
              ON m.campaign_id = c.id AND m.user_id = $2
            WHERE c.id = $1
            "#,
        )
        .bind(campaign_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(access)
    }

    pub async fn find_for_campaign(
        campaign_id: CampaignId,
        pool: &PgPool,
    ) -> Result<Vec<MemberWithUser>> {
        let members = sqlx::query_as::<_, MemberWithUser>(
            r#"
            SELECT m.campaign_id, m.user_id, m.role, u.email, u.display_name,
                   u.role AS global_role, m.created_at
            FROM campaign_members m
            JOIN admin_users u ON u.id = m.user_id
            WHERE m.campaign_id = $1
            ORDER BY CASE m.role WHEN 'owner' THEN 0 WHEN 'editor' THEN 1 ELSE 2 END,
                     LOWER(u.email)
            "#,
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await?;
        Ok(members)
    }

    pub async fn upsert<'e>(
        campaign_id: CampaignId,
        user_id: AdminUserId,
        role: MemberRole,
        added_by: Option<AdminUserId>,
        db: impl PgExecutor<'e>,
    ) -> Result<Self> {
        let member = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO campaign_members (campaign_id, user_id, role, added_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (campaign_id, user_id) DO UPDATE SET role = EXCLUDED.role
            RETURNING *
            "#,
        )
        .bind(campaign_id)
        .bind(user_id)
        .bind(role)
        .bind(added_by)
        .fetch_one(db)
        .await?;
        Ok(member)
    }

    pub async fn remove<'e>(
        campaign_id: CampaignId,
        user_id: AdminUserId,
        db: impl PgExecutor<'e>,
    ) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM campaign_members WHERE campaign_id = $1 AND user_id = $2")
                .bind(campaign_id)
                .bind(user_id)
                .execute(db)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lock the campaign's owner rows and return their user ids
    pub async fn lock_owners<'e>(
        campaign_id: CampaignId,
        db: impl PgExecutor<'e>,
    ) -> Result<Vec<AdminUserId>> {
        let owners = sqlx::query_scalar::<_, AdminUserId>(
            r#"
            SELECT user_id FROM campaign_members
            WHERE campaign_id = $1 AND role = 'owner'
            ORDER BY user_id
            FOR UPDATE
            "#,
        )
        .bind(campaign_id)
        .fetch_all(db)
        .await?;
        Ok(owners)
    }

    /// Slugs of campaigns where `user_id` is the only owner
    pub async fn campaigns_solely_owned_by(user_id: AdminUserId, pool: &PgPool) -> Result<Vec<String>> {
        let slugs = sqlx::query_scalar::<_, String>(
            r#"
            SELECT c.slug
            FROM campaigns c
            JOIN campaign_members m ON m.campaign_id = c.id
            WHERE m.user_id = $1 AND m.role = 'owner'
              AND NOT EXISTS (
                SELECT 1 FROM campaign_members o
                WHERE o.campaign_id = c.id AND o.role = 'owner' AND o.user_id <> $1
              )
            ORDER BY c.slug
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(slugs)
    }
}
