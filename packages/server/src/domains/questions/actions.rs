use serde::Deserialize;
use tracing::info;

use crate::common::{Actor, AppError, AppResult, CampaignCapability, CampaignId, QuestionId};
use crate::domains::questions::models::{CampaignQuestion, QuestionFields, QuestionType};
use crate::domains::questions::rules::{check_reorder, normalize_options};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    pub prompt: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub is_required: bool,
}

impl QuestionInput {
    fn into_fields(self) -> AppResult<QuestionFields> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(AppError::invalid("prompt", "is required"));
        }
        let options = normalize_options(self.question_type, self.options)
            .map_err(|e| AppError::Validation(vec![e]))?;

        Ok(QuestionFields {
            prompt,
            question_type: self.question_type,
            options,
            is_required: self.is_required,
        })
    }
}

pub async fn list_questions(
    actor: Actor,
    campaign_id: CampaignId,
    deps: &ServerDeps,
) -> AppResult<Vec<CampaignQuestion>> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::View)
        .check(&deps.db_pool)
        .await?;

    Ok(CampaignQuestion::find_for_campaign(campaign_id, &deps.db_pool).await?)
}

pub async fn create_question(
    actor: Actor,
    campaign_id: CampaignId,
    input: QuestionInput,
    deps: &ServerDeps,
) -> AppResult<CampaignQuestion> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::ManageQuestions)
        .check(&deps.db_pool)
        .await?;

    let fields = input.into_fields()?;
    let question = CampaignQuestion::create(campaign_id, &fields, &deps.db_pool).await?;

    info!(campaign_id = %campaign_id, question_id = %question.id, "Question created");
    Ok(question)
}

pub async fn update_question(
    actor: Actor,
    campaign_id: CampaignId,
    question_id: QuestionId,
    input: QuestionInput,
    deps: &ServerDeps,
) -> AppResult<CampaignQuestion> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::ManageQuestions)
        .check(&deps.db_pool)
        .await?;

    let fields = input.into_fields()?;
    CampaignQuestion::update(question_id, campaign_id, &fields, &deps.db_pool)
        .await?
        .ok_or(AppError::NotFound("Question"))
}

pub async fn delete_question(
    actor: Actor,
    campaign_id: CampaignId,
    question_id: QuestionId,
    deps: &ServerDeps,
) -> AppResult<()> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::ManageQuestions)
        .check(&deps.db_pool)
        .await?;

    if !CampaignQuestion::delete(question_id, campaign_id, &deps.db_pool).await? {
        return Err(AppError::NotFound("Question"));
    }

    info!(campaign_id = %campaign_id, question_id = %question_id, "Question deleted");
    Ok(())
}

pub async fn reorder_questions(
    actor: Actor,
    campaign_id: CampaignId,
    order: Vec<QuestionId>,
    deps: &ServerDeps,
) -> AppResult<Vec<CampaignQuestion>> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::ManageQuestions)
        .check(&deps.db_pool)
        .await?;

    let mut tx = deps.db_pool.begin().await?;

    let existing: Vec<QuestionId> = CampaignQuestion::find_for_campaign(campaign_id, &mut *tx)
        .await?
        .into_iter()
        .map(|q| q.id)
        .collect();
    check_reorder(&existing, &order).map_err(|msg| AppError::invalid("question_ids", msg))?;

    for (position, id) in order.iter().enumerate() {
        CampaignQuestion::set_display_order(*id, position as i32, &mut *tx).await?;
    }

    let questions = CampaignQuestion::find_for_campaign(campaign_id, &mut *tx).await?;
    tx.commit().await?;

    Ok(questions)
}
