use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use crate::common::{CampaignId, QuestionId};

crate::text_enum! {
    pub enum QuestionType {
        Text => "text",
        MultipleChoice => "multiple_choice",
        Checkboxes => "checkboxes",
    }
}

impl QuestionType {
    pub fn has_options(&self) -> bool {
        !matches!(self, QuestionType::Text)
    }
}

/// Custom question shown on a campaign's claim form
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CampaignQuestion {
    pub id: QuestionId,
    pub campaign_id: CampaignId,
    pub prompt: String,
    pub question_type: QuestionType,
    pub options: Json<Vec<String>>,
    pub is_required: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct QuestionFields {
    pub prompt: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub is_required: bool,
}

impl CampaignQuestion {
    pub async fn find_for_campaign<'e>(
        campaign_id: CampaignId,
        db: impl PgExecutor<'e>,
    ) -> Result<Vec<Self>> {
        let questions = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM campaign_questions
            WHERE campaign_id = $1
            ORDER BY display_order, created_at
            "#,
        )
        .bind(campaign_id)
        .fetch_all(db)
        .await?;
        Ok(questions)
    }

    pub async fn find_in_campaign(
        id: QuestionId,
        campaign_id: CampaignId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let question = sqlx::query_as::<_, Self>(
            "SELECT * FROM campaign_questions WHERE id = $1 AND campaign_id = $2",
        )
        .bind(id)
        .bind(campaign_id)
        .fetch_optional(pool)
        .await?;
        Ok(question)
    }

    /// Insert at the end of the campaign's question list
    pub async fn create<'e>(
        campaign_id: CampaignId,
        fields: &QuestionFields,
        db: impl PgExecutor<'e>,
    ) -> Result<Self> {
        let question = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO campaign_questions
                (id, campaign_id, prompt, question_type, options, is_required, display_order)
            VALUES (
                $1, $2, $3, $4, $5, $6,
                (SELECT COALESCE(MAX(display_order) + 1, 0)
                 FROM campaign_questions WHERE campaign_id = $2)
            )
            RETURNING *
            "#,
        )
        .bind(QuestionId::new())
        .bind(campaign_id)
        .bind(&fields.prompt)
        .bind(fields.question_type)
        .bind(Json(&fields.options))
        .bind(fields.is_required)
        .fetch_one(db)
        .await?;
        Ok(question)
    }

    pub async fn update(
        id: QuestionId,
        campaign_id: CampaignId,
        fields: &QuestionFields,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let question = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaign_questions SET
                prompt = $3,
                question_type = $4,
                options = $5,
                is_required = $6,
                updated_at = NOW()
            WHERE id = $1 AND campaign_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(campaign_id)
        .bind(&fields.prompt)
        .bind(fields.question_type)
        .bind(Json(&fields.options))
        .bind(fields.is_required)
        .fetch_optional(pool)
        .await?;
        Ok(question)
    }

    pub async fn set_display_order<'e>(
        id: QuestionId,
        display_order: i32,
        db: impl PgExecutor<'e>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE campaign_questions SET display_order = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(display_order)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Deletes the question; its answers go with it (ON DELETE CASCADE)
    pub async fn delete(id: QuestionId, campaign_id: CampaignId, pool: &PgPool) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM campaign_questions WHERE id = $1 AND campaign_id = $2")
                .bind(id)
                .bind(campaign_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
