use anyhow::Result;
use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::AdminUserId;

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// JWT Claims - data stored in the token
///
/// Roles are deliberately absent: the auth middleware reloads the admin user
/// on every request so demotions apply immediately.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,   // Subject (admin user id as string)
    pub email: String, // For logging/debugging
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<AdminUserId> {
        Ok(AdminUserId::parse(&self.sub)?)
    }
}

/// JWT Service - creates and verifies admin session tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Create a token for an admin user, valid for `ttl`
    pub fn create_token(&self, user_id: AdminUserId, email: &str, ttl: Duration) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a token; fails when expired, forged or from another issuer
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(h: i64) -> Duration {
        Duration::hours(h)
    }

    #[test]
    fn create_and_verify_token() {
        let service = JwtService::new("test_secret_key", "test_issuer".to_string());
        let user_id = AdminUserId::new();

        let token = service
            .create_token(user_id, "ops@kin.example", hours(1))
            .unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "ops@kin.example");
        assert_eq!(claims.iss, "test_issuer");
    }

    #[test]
    fn invalid_token() {
        let service = JwtService::new("test_secret_key", "test_issuer".to_string());
        assert!(service.verify_token("invalid_token").is_err());
    }

    #[test]
    fn wrong_secret() {
        let service1 = JwtService::new("secret1", "test_issuer".to_string());
        let service2 = JwtService::new("secret2", "test_issuer".to_string());

        let token = service1
            .create_token(AdminUserId::new(), "ops@kin.example", hours(1))
            .unwrap();

        assert!(service2.verify_token(&token).is_err());
    }

    #[test]
    fn wrong_issuer() {
        let service1 = JwtService::new("secret", "issuer-a".to_string());
        let service2 = JwtService::new("secret", "issuer-b".to_string());

        let token = service1
            .create_token(AdminUserId::new(), "ops@kin.example", hours(1))
            .unwrap();

        assert!(service2.verify_token(&token).is_err());
    }

    #[test]
    fn expired_token() {
        let service = JwtService::new("test_secret_key", "test_issuer".to_string());
        // Well past the default 60s leeway
        let token = service
            .create_token(AdminUserId::new(), "ops@kin.example", hours(-2))
            .unwrap();

        assert!(service.verify_token(&token).is_err());
    }
}
