//! Admin routes not scoped to a campaign: the caller's own profile, admin
//! user management and gift codes.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::common::{AdminUserId, AppResult, GiftCodeId, GlobalRole};
use crate::domains::admin_users::actions::{self as admin_users, CreateAdminUserInput};
use crate::domains::admin_users::{AdminUser, UpdateProfile};
use crate::domains::gifting::actions::{
    self as gifting, CreateGiftCodeInput, GiftCodeWithLink, UpdateGiftCodeInput,
};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct RoleInput {
    pub role: GlobalRole,
}

pub async fn get_me(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> AppResult<Json<AdminUser>> {
    let me = admin_users::get_me(user.actor(), &state.deps).await?;
    Ok(Json(me))
}

pub async fn update_me(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<UpdateProfile>,
) -> AppResult<Json<AdminUser>> {
    let me = admin_users::update_me(user.actor(), input, &state.deps).await?;
    Ok(Json(me))
}

pub async fn list_admin_users(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<AdminUser>>> {
    let users = admin_users::list_admin_users(user.actor(), &state.deps).await?;
    Ok(Json(users))
}

pub async fn create_admin_user(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateAdminUserInput>,
) -> AppResult<(StatusCode, Json<AdminUser>)> {
    let created = admin_users::create_admin_user(user.actor(), input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_admin_role(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(user_id): Path<AdminUserId>,
    Json(input): Json<RoleInput>,
) -> AppResult<Json<AdminUser>> {
    let updated =
        admin_users::update_admin_role(user.actor(), user_id, input.role, &state.deps).await?;
    Ok(Json(updated))
}

pub async fn delete_admin_user(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(user_id): Path<AdminUserId>,
) -> AppResult<StatusCode> {
    admin_users::delete_admin_user(user.actor(), user_id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_gift_codes(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<GiftCodeWithLink>>> {
    let gifts = gifting::list_gift_codes(user.actor(), &state.deps).await?;
    Ok(Json(gifts))
}

pub async fn create_gift_code(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateGiftCodeInput>,
) -> AppResult<(StatusCode, Json<GiftCodeWithLink>)> {
    let gift = gifting::create_gift_code(user.actor(), input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(gift)))
}

pub async fn update_gift_code(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<GiftCodeId>,
    Json(input): Json<UpdateGiftCodeInput>,
) -> AppResult<Json<GiftCodeWithLink>> {
    let gift = gifting::update_gift_code(user.actor(), id, input, &state.deps).await?;
    Ok(Json(gift))
}

pub async fn delete_gift_code(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<GiftCodeId>,
) -> AppResult<StatusCode> {
    gifting::delete_gift_code(user.actor(), id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}
