//! Server dependencies shared by every domain action.

use sqlx::PgPool;
use std::sync::Arc;

use crate::domains::auth::JwtService;

#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub jwt_service: Arc<JwtService>,
    /// Base URL of the public claim site (no trailing slash)
    pub public_base_url: String,
}

impl ServerDeps {
    pub fn new(db_pool: PgPool, jwt_service: Arc<JwtService>, public_base_url: String) -> Self {
        Self {
            db_pool,
            jwt_service,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Link a recipient follows to complete a pre-created claim
    pub fn claim_link(&self, token: &str) -> String {
        format!("{}/claim/{}", self.public_base_url, token)
    }

    /// Link encoded in an admin's gift QR code
    pub fn gift_link(&self, code: &str) -> String {
        format!("{}/gift/{}", self.public_base_url, code)
    }
}
