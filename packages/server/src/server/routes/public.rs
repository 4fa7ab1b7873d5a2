//! Unauthenticated routes behind the public claim site.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};

use crate::common::AppResult;
use crate::domains::campaigns::actions as campaigns;
use crate::domains::campaigns::public::PublicCampaign;
use crate::domains::claims::actions::{
    self as claims, ClaimTokenView, CompleteClaimInput, SubmitClaimInput, SubmittedClaim,
};
use crate::domains::gifting::actions::{self as gifting, GiftView};
use crate::server::app::AppState;

pub async fn get_campaign(
    Extension(state): Extension<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<PublicCampaign>> {
    let campaign = campaigns::get_public_campaign(&slug, &state.deps).await?;
    Ok(Json(campaign))
}

pub async fn submit_claim(
    Extension(state): Extension<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<SubmitClaimInput>,
) -> AppResult<(StatusCode, Json<SubmittedClaim>)> {
    let submitted = claims::submit_claim(&slug, input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

pub async fn view_claim(
    Extension(state): Extension<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<ClaimTokenView>> {
    let view = claims::view_claim_by_token(&token, &state.deps).await?;
    Ok(Json(view))
}

pub async fn complete_claim(
    Extension(state): Extension<AppState>,
    Path(token): Path<String>,
    Json(input): Json<CompleteClaimInput>,
) -> AppResult<Json<SubmittedClaim>> {
    let completed = claims::complete_claim_by_token(&token, input, &state.deps).await?;
    Ok(Json(completed))
}

pub async fn resolve_gift(
    Extension(state): Extension<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<GiftView>> {
    let gift = gifting::resolve_gift_code(&code, &state.deps).await?;
    Ok(Json(gift))
}

pub async fn submit_gift_claim(
    Extension(state): Extension<AppState>,
    Path(code): Path<String>,
    Json(input): Json<SubmitClaimInput>,
) -> AppResult<(StatusCode, Json<SubmittedClaim>)> {
    let submitted = gifting::submit_gift_claim(&code, input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}
