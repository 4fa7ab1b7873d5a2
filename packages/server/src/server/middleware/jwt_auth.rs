use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::common::{Actor, AdminUserId, AppError, AuthError, GlobalRole};
use crate::domains::admin_users::AdminUser;
use crate::domains::auth::{Claims, JwtService};
use crate::kernel::ServerDeps;

/// Authenticated admin, loaded fresh from the database on each request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: AdminUserId,
    pub email: String,
    pub role: GlobalRole,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }
}

/// JWT authentication middleware
///
/// Verifies the bearer token and adds `AuthUser` to request extensions.
/// Requests without a valid token continue unauthenticated; admin handlers
/// reject them through the `AuthUser` extractor.
pub async fn jwt_auth_middleware(
    deps: Arc<ServerDeps>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(claims) = extract_claims(request.headers(), &deps.jwt_service) {
        match load_user(&claims, &deps).await {
            Some(user) => {
                debug!(user_id = %user.user_id, role = %user.role, "Authenticated admin");
                request.extensions_mut().insert(user);
            }
            None => debug!(sub = %claims.sub, "Token for unknown admin user"),
        }
    }

    next.run(request).await
}

/// Extract and verify the token from the Authorization header
fn extract_claims(headers: &HeaderMap, jwt_service: &JwtService) -> Option<Claims> {
    let auth_str = headers.get(AUTHORIZATION)?.to_str().ok()?;

    // Accept both "Bearer <token>" and a raw token
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();

    jwt_service.verify_token(token).ok()
}

async fn load_user(claims: &Claims, deps: &ServerDeps) -> Option<AuthUser> {
    let user_id = claims.user_id().ok()?;
    match AdminUser::find_by_id(user_id, &deps.db_pool).await {
        Ok(user) => user.map(|u| AuthUser {
            user_id: u.id,
            email: u.email,
            role: u.role,
        }),
        Err(e) => {
            warn!(error = %e, "Failed to load admin user for token");
            None
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Auth(AuthError::AuthenticationRequired))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use chrono::Duration;

    use super::*;

    fn service() -> JwtService {
        JwtService::new("test_secret", "test_issuer".to_string())
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn reads_bearer_token() {
        let jwt = service();
        let user_id = AdminUserId::new();
        let token = jwt
            .create_token(user_id, "ada@example.com", Duration::hours(1))
            .unwrap();

        let claims = extract_claims(&headers(&format!("Bearer {}", token)), &jwt).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn reads_raw_token() {
        let jwt = service();
        let token = jwt
            .create_token(AdminUserId::new(), "ada@example.com", Duration::hours(1))
            .unwrap();

        assert!(extract_claims(&headers(&token), &jwt).is_some());
    }

    #[test]
    fn no_header_means_no_claims() {
        assert!(extract_claims(&HeaderMap::new(), &service()).is_none());
    }

    #[test]
    fn rejects_tokens_from_another_secret() {
        let other = JwtService::new("other_secret", "test_issuer".to_string());
        let token = other
            .create_token(AdminUserId::new(), "ada@example.com", Duration::hours(1))
            .unwrap();

        assert!(extract_claims(&headers(&token), &service()).is_none());
        assert!(extract_claims(&headers("Bearer invalid_token"), &service()).is_none());
    }
}
