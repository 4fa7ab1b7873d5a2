//! Application setup and router configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::kernel::ServerDeps;
use crate::server::middleware::{jwt_auth_middleware, rate_limited, RateLimit};
use crate::server::routes::{admin, campaigns, claims, health_handler, public};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
    /// Per-IP limit on public routes; `None` disables it
    pub rate_limit: Option<RateLimit>,
}

/// Build the Axum application router
///
/// - `/health`
/// - `/api/public/...`: claim site, no auth, rate limited per IP
/// - `/api/...`: admin routes, bearer token required
pub fn build_app(deps: ServerDeps, options: AppOptions) -> Router {
    let deps = Arc::new(deps);
    let state = AppState { deps: deps.clone() };

    let public_routes = Router::new()
        .route("/campaigns/:slug", get(public::get_campaign))
        .route("/campaigns/:slug/claims", post(public::submit_claim))
        .route(
            "/claims/:token",
            get(public::view_claim).post(public::complete_claim),
        )
        .route("/gifts/:code", get(public::resolve_gift))
        .route("/gifts/:code/claims", post(public::submit_gift_claim));

    let public_routes = match options.rate_limit {
        Some(limit) => rate_limited(public_routes, limit),
        None => public_routes,
    };

    let admin_routes = Router::new()
        // Own profile and admin users
        .route("/me", get(admin::get_me).patch(admin::update_me))
        .route(
            "/admin-users",
            get(admin::list_admin_users).post(admin::create_admin_user),
        )
        .route("/admin-users/:user_id", delete(admin::delete_admin_user))
        .route("/admin-users/:user_id/role", put(admin::update_admin_role))
        // Gift codes
        .route(
            "/gift-codes",
            get(admin::list_gift_codes).post(admin::create_gift_code),
        )
        .route(
            "/gift-codes/:gift_code_id",
            patch(admin::update_gift_code).delete(admin::delete_gift_code),
        )
        // Campaigns
        .route(
            "/campaigns",
            get(campaigns::list_campaigns).post(campaigns::create_campaign),
        )
        .route(
            "/campaigns/:id",
            get(campaigns::get_campaign)
                .patch(campaigns::update_campaign)
                .delete(campaigns::delete_campaign),
        )
        .route("/campaigns/:id/duplicate", post(campaigns::duplicate_campaign))
        .route("/campaigns/:id/stats", get(campaigns::campaign_stats))
        // Versions
        .route("/campaigns/:id/versions", get(campaigns::list_versions))
        .route(
            "/campaigns/:id/versions/:number/revert",
            post(campaigns::revert_to_version),
        )
        .route(
            "/campaigns/:id/draft",
            get(campaigns::get_draft)
                .put(campaigns::save_draft)
                .delete(campaigns::discard_draft),
        )
        .route("/campaigns/:id/draft/publish", post(campaigns::publish_draft))
        // Questions
        .route(
            "/campaigns/:id/questions",
            get(campaigns::list_questions).post(campaigns::create_question),
        )
        .route(
            "/campaigns/:id/questions/:question_id",
            put(campaigns::update_question).delete(campaigns::delete_question),
        )
        .route("/campaigns/:id/question-order", put(campaigns::reorder_questions))
        // Members
        .route(
            "/campaigns/:id/members",
            get(campaigns::list_members).put(campaigns::set_member),
        )
        .route(
            "/campaigns/:id/members/:user_id",
            delete(campaigns::remove_member),
        )
        // Invite codes
        .route(
            "/campaigns/:id/invite-codes",
            get(campaigns::list_invite_codes).post(campaigns::create_invite_codes),
        )
        .route(
            "/campaigns/:id/invite-codes/:code_id",
            patch(campaigns::update_invite_code)
                .delete(campaigns::remove_invite_code),
        )
        // Claims
        .route(
            "/campaigns/:id/claims",
            get(claims::list_claims).delete(claims::delete_claims),
        )
        .route(
            "/campaigns/:id/claims/:claim_id",
            get(claims::get_claim)
                .patch(claims::update_claim)
                .delete(claims::delete_claim),
        )
        .route("/campaigns/:id/pre-created-claims", post(claims::pre_create_claims))
        .route("/campaigns/:id/shipments", post(claims::ship_claims))
        .route("/campaigns/:id/shipments/clear", post(claims::unship_claims))
        .route("/campaigns/:id/import", post(claims::import_claims))
        .route("/campaigns/:id/export", get(claims::export_claims))
        // JWT authentication (handlers reject anonymous callers via AuthUser)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(deps.clone(), req, next)
        }));

    Router::new()
        // Health check (no auth, no rate limit)
        .route("/health", get(health_handler))
        .nest("/api/public", public_routes)
        .nest("/api", admin_routes)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(state))
        .layer(cors_layer(&options.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([CONTENT_DISPOSITION])
}
