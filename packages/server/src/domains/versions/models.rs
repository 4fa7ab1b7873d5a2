use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use crate::common::{AdminUserId, CampaignId, CampaignVersionId};
use crate::domains::campaigns::CampaignSettings;

crate::text_enum! {
    pub enum VersionStatus {
        Draft => "draft",
        Published => "published",
    }
}

/// One snapshot of a campaign's settings
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CampaignVersion {
    pub id: CampaignVersionId,
    pub campaign_id: CampaignId,
    pub version_number: i32,
    pub status: VersionStatus,
    pub data: Json<CampaignSettings>,
    pub change_summary: Option<String>,
    pub created_by: Option<AdminUserId>,
    pub published_by: Option<AdminUserId>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CampaignVersion {
    pub fn settings(&self) -> &CampaignSettings {
        &self.data.0
    }

    pub async fn find_draft<'e>(
        campaign_id: CampaignId,
        db: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        let version = sqlx::query_as::<_, Self>(
            "SELECT * FROM campaign_versions WHERE campaign_id = $1 AND status = 'draft'",
        )
        .bind(campaign_id)
        .fetch_optional(db)
        .await?;
        Ok(version)
    }

    pub async fn find_by_number<'e>(
        campaign_id: CampaignId,
        version_number: i32,
        db: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        let version = sqlx::query_as::<_, Self>(
            "SELECT * FROM campaign_versions WHERE campaign_id = $1 AND version_number = $2",
        )
        .bind(campaign_id)
        .bind(version_number)
        .fetch_optional(db)
        .await?;
        Ok(version)
    }

    /// Full history, newest first
    pub async fn find_all(campaign_id: CampaignId, pool: &PgPool) -> Result<Vec<Self>> {
        let versions = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM campaign_versions
            WHERE campaign_id = $1
            ORDER BY version_number DESC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await?;
        Ok(versions)
    }

    /// Highest version number used so far (0 when there is none)
    pub async fn max_version_number<'e>(
        campaign_id: CampaignId,
        db: impl PgExecutor<'e>,
    ) -> Result<i32> {
        let max = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(version_number), 0) FROM campaign_versions WHERE campaign_id = $1",
        )
        .bind(campaign_id)
        .fetch_one(db)
        .await?;
        Ok(max)
    }

    pub async fn insert_draft<'e>(
        campaign_id: CampaignId,
        version_number: i32,
        settings: &CampaignSettings,
        change_summary: Option<&str>,
        created_by: AdminUserId,
        db: impl PgExecutor<'e>,
    ) -> Result<Self> {
        let version = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO campaign_versions
                (id, campaign_id, version_number, status, data, change_summary, created_by)
            VALUES ($1, $2, $3, 'draft', $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(CampaignVersionId::new())
        .bind(campaign_id)
        .bind(version_number)
        .bind(Json(settings))
        .bind(change_summary)
        .bind(created_by)
        .fetch_one(db)
        .await?;
        Ok(version)
    }

    /// Insert an already published version (a new campaign's first state)
    pub async fn insert_published<'e>(
        campaign_id: CampaignId,
        version_number: i32,
        settings: &CampaignSettings,
        change_summary: Option<&str>,
        created_by: AdminUserId,
        db: impl PgExecutor<'e>,
    ) -> Result<Self> {
        let version = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO campaign_versions
                (id, campaign_id, version_number, status, data, change_summary,
                 created_by, published_by, published_at)
            VALUES ($1, $2, $3, 'published', $4, $5, $6, $6, NOW())
            RETURNING *
            "#,
        )
        .bind(CampaignVersionId::new())
        .bind(campaign_id)
        .bind(version_number)
        .bind(Json(settings))
        .bind(change_summary)
        .bind(created_by)
        .fetch_one(db)
        .await?;
        Ok(version)
    }

    pub async fn update_draft<'e>(
        id: CampaignVersionId,
        settings: &CampaignSettings,
        change_summary: Option<&str>,
        db: impl PgExecutor<'e>,
    ) -> Result<Self> {
        let version = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaign_versions SET
                data = $2,
                change_summary = $3,
                updated_at = NOW()
            WHERE id = $1 AND status = 'draft'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(settings))
        .bind(change_summary)
        .fetch_one(db)
        .await?;
        Ok(version)
    }

    pub async fn mark_published<'e>(
        id: CampaignVersionId,
        published_by: AdminUserId,
        db: impl PgExecutor<'e>,
    ) -> Result<Self> {
        let version = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaign_versions SET
                status = 'published',
                published_by = $2,
                published_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(published_by)
        .fetch_one(db)
        .await?;
        Ok(version)
    }

    pub async fn delete<'e>(id: CampaignVersionId, db: impl PgExecutor<'e>) -> Result<bool> {
        let result = sqlx::query("DELETE FROM campaign_versions WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
