//! Invite codes gating campaigns that require one

pub mod actions;
pub mod models;

pub use models::InviteCode;
