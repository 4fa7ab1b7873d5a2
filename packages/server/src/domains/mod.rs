// Business domains
pub mod admin_users;
pub mod auth;
pub mod campaigns;
pub mod claims;
pub mod exports;
pub mod gifting;
pub mod imports;
pub mod invite_codes;
pub mod members;
pub mod questions;
pub mod versions;
