//! Admin routes for campaigns and what hangs off them: versions, questions,
//! members and invite codes.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::common::{AdminUserId, AppResult, CampaignId, InviteCodeId, QuestionId};
use crate::domains::campaigns::actions::{
    self as campaigns, CampaignDetail, CampaignStats, CampaignSummary, CreateCampaignInput,
    DuplicateCampaignInput, UpdateCampaignInput,
};
use crate::domains::campaigns::Campaign;
use crate::domains::invite_codes::actions::{
    self as invite_codes, CreateInviteCodesInput, InviteCodeRemoval, UpdateInviteCodeInput,
};
use crate::domains::invite_codes::models::InviteCode;
use crate::domains::members::actions::{self as members, SetMemberInput};
use crate::domains::members::{CampaignMember, MemberWithUser};
use crate::domains::questions::actions::{self as questions, QuestionInput};
use crate::domains::questions::CampaignQuestion;
use crate::domains::versions::actions::{self as versions, PublishedVersion, SaveDraftInput};
use crate::domains::versions::CampaignVersion;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct QuestionOrder {
    pub question_ids: Vec<QuestionId>,
}

// Campaigns

pub async fn list_campaigns(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<CampaignSummary>>> {
    let list = campaigns::list_campaigns(user.actor(), &state.deps).await?;
    Ok(Json(list))
}

pub async fn create_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateCampaignInput>,
) -> AppResult<(StatusCode, Json<Campaign>)> {
    let campaign = campaigns::create_campaign(user.actor(), input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn get_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> AppResult<Json<CampaignDetail>> {
    let detail = campaigns::get_campaign(user.actor(), id, &state.deps).await?;
    Ok(Json(detail))
}

pub async fn update_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<UpdateCampaignInput>,
) -> AppResult<Json<Campaign>> {
    let campaign = campaigns::update_campaign(user.actor(), id, input, &state.deps).await?;
    Ok(Json(campaign))
}

pub async fn delete_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> AppResult<StatusCode> {
    campaigns::delete_campaign(user.actor(), id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn duplicate_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<DuplicateCampaignInput>,
) -> AppResult<(StatusCode, Json<Campaign>)> {
    let copy = campaigns::duplicate_campaign(user.actor(), id, input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

pub async fn campaign_stats(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> AppResult<Json<CampaignStats>> {
    let stats = campaigns::campaign_stats(user.actor(), id, &state.deps).await?;
    Ok(Json(stats))
}

// Versions

pub async fn list_versions(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> AppResult<Json<Vec<CampaignVersion>>> {
    let list = versions::list_versions(user.actor(), id, &state.deps).await?;
    Ok(Json(list))
}

pub async fn get_draft(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> AppResult<Json<CampaignVersion>> {
    let draft = versions::get_draft(user.actor(), id, &state.deps).await?;
    Ok(Json(draft))
}

pub async fn save_draft(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<SaveDraftInput>,
) -> AppResult<Json<CampaignVersion>> {
    let version = versions::save_draft(user.actor(), id, input, &state.deps).await?;
    Ok(Json(version))
}

pub async fn publish_draft(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> AppResult<Json<PublishedVersion>> {
    let published = versions::publish_draft(user.actor(), id, &state.deps).await?;
    Ok(Json(published))
}

pub async fn discard_draft(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> AppResult<StatusCode> {
    versions::discard_draft(user.actor(), id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revert_to_version(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, number)): Path<(CampaignId, i32)>,
) -> AppResult<Json<CampaignVersion>> {
    let draft = versions::revert_to_version(user.actor(), id, number, &state.deps).await?;
    Ok(Json(draft))
}

// Questions

pub async fn list_questions(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> AppResult<Json<Vec<CampaignQuestion>>> {
    let list = questions::list_questions(user.actor(), id, &state.deps).await?;
    Ok(Json(list))
}

pub async fn create_question(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<QuestionInput>,
) -> AppResult<(StatusCode, Json<CampaignQuestion>)> {
    let question = questions::create_question(user.actor(), id, input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn update_question(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, question_id)): Path<(CampaignId, QuestionId)>,
    Json(input): Json<QuestionInput>,
) -> AppResult<Json<CampaignQuestion>> {
    let question =
        questions::update_question(user.actor(), id, question_id, input, &state.deps).await?;
    Ok(Json(question))
}

pub async fn delete_question(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, question_id)): Path<(CampaignId, QuestionId)>,
) -> AppResult<StatusCode> {
    questions::delete_question(user.actor(), id, question_id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_questions(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<QuestionOrder>,
) -> AppResult<Json<Vec<CampaignQuestion>>> {
    let list =
        questions::reorder_questions(user.actor(), id, input.question_ids, &state.deps).await?;
    Ok(Json(list))
}

// Members

pub async fn list_members(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> AppResult<Json<Vec<MemberWithUser>>> {
    let list = members::list_members(user.actor(), id, &state.deps).await?;
    Ok(Json(list))
}

pub async fn set_member(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<SetMemberInput>,
) -> AppResult<Json<CampaignMember>> {
    let member = members::set_member(user.actor(), id, input, &state.deps).await?;
    Ok(Json(member))
}

pub async fn remove_member(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, user_id)): Path<(CampaignId, AdminUserId)>,
) -> AppResult<StatusCode> {
    members::remove_member(user.actor(), id, user_id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Invite codes

pub async fn list_invite_codes(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> AppResult<Json<Vec<InviteCode>>> {
    let list = invite_codes::list_invite_codes(user.actor(), id, &state.deps).await?;
    Ok(Json(list))
}

pub async fn create_invite_codes(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<CreateInviteCodesInput>,
) -> AppResult<(StatusCode, Json<Vec<InviteCode>>)> {
    let codes = invite_codes::create_invite_codes(user.actor(), id, input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(codes)))
}

pub async fn update_invite_code(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, code_id)): Path<(CampaignId, InviteCodeId)>,
    Json(input): Json<UpdateInviteCodeInput>,
) -> AppResult<Json<InviteCode>> {
    let code =
        invite_codes::update_invite_code(user.actor(), id, code_id, input, &state.deps).await?;
    Ok(Json(code))
}

pub async fn remove_invite_code(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, code_id)): Path<(CampaignId, InviteCodeId)>,
) -> AppResult<Json<InviteCodeRemoval>> {
    let outcome = invite_codes::remove_invite_code(user.actor(), id, code_id, &state.deps).await?;
    Ok(Json(outcome))
}
