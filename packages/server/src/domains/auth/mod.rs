//! Auth domain - admin session tokens
//!
//! Sign-in itself happens at the identity provider; this service only
//! verifies the HS256 tokens it shares a secret with (and mints them for
//! operators through `kin-admin token`).

pub mod jwt;

pub use jwt::{Claims, JwtService, DEFAULT_TOKEN_TTL_HOURS};
