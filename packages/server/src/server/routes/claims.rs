//! Admin routes for a campaign's claims, including CSV import and export.

use axum::{
    extract::{Extension, Path, Query},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::common::{AppResult, CampaignId, ClaimId, Page, PaginationArgs};
use crate::domains::claims::actions::{
    self as claims, ClaimIdsInput, ClaimWithAnswers, DeletedCount, PreCreateClaimsInput,
    PreCreatedClaim, ShipClaimsInput, ShipmentReport, UpdateClaimInput,
};
use crate::domains::claims::models::{Claim, ClaimFilter};
use crate::domains::exports::actions as exports;
use crate::domains::imports::actions::{self as imports, ImportReport};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Debug, Default, Deserialize)]
pub struct BulkDeleteParams {
    #[serde(default)]
    pub test_only: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportParams {
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct Unshipped {
    pub cleared: u64,
}

pub async fn list_claims(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Query(filter): Query<ClaimFilter>,
    Query(pagination): Query<PaginationArgs>,
) -> AppResult<Json<Page<Claim>>> {
    let page = claims::list_claims(user.actor(), id, filter, pagination, &state.deps).await?;
    Ok(Json(page))
}

pub async fn get_claim(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, claim_id)): Path<(CampaignId, ClaimId)>,
) -> AppResult<Json<ClaimWithAnswers>> {
    let claim = claims::get_claim(user.actor(), id, claim_id, &state.deps).await?;
    Ok(Json(claim))
}

pub async fn update_claim(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, claim_id)): Path<(CampaignId, ClaimId)>,
    Json(input): Json<UpdateClaimInput>,
) -> AppResult<Json<Claim>> {
    let claim = claims::update_claim(user.actor(), id, claim_id, input, &state.deps).await?;
    Ok(Json(claim))
}

pub async fn delete_claim(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, claim_id)): Path<(CampaignId, ClaimId)>,
) -> AppResult<StatusCode> {
    claims::delete_claim(user.actor(), id, claim_id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_claims(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Query(params): Query<BulkDeleteParams>,
) -> AppResult<Json<DeletedCount>> {
    let deleted = claims::delete_claims(user.actor(), id, params.test_only, &state.deps).await?;
    Ok(Json(deleted))
}

pub async fn pre_create_claims(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<PreCreateClaimsInput>,
) -> AppResult<(StatusCode, Json<Vec<PreCreatedClaim>>)> {
    let created = claims::pre_create_claims(user.actor(), id, input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn ship_claims(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<ShipClaimsInput>,
) -> AppResult<Json<ShipmentReport>> {
    let report = claims::ship_claims(user.actor(), id, input, &state.deps).await?;
    Ok(Json(report))
}

pub async fn unship_claims(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<ClaimIdsInput>,
) -> AppResult<Json<Unshipped>> {
    let cleared = claims::unship_claims(user.actor(), id, input, &state.deps).await?;
    Ok(Json(Unshipped { cleared }))
}

/// CSV body in, import report out
pub async fn import_claims(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Query(params): Query<ImportParams>,
    body: String,
) -> AppResult<Json<ImportReport>> {
    let report = imports::import_claims(user.actor(), id, &body, params.dry_run, &state.deps).await?;
    Ok(Json(report))
}

pub async fn export_claims(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Query(filter): Query<ClaimFilter>,
) -> AppResult<impl IntoResponse> {
    let export = exports::export_claims(user.actor(), id, filter, &state.deps).await?;

    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    ))
}
