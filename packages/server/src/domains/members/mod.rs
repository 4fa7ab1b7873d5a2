//! Campaign members - per-campaign roles layered on top of global roles

pub mod actions;
pub mod models;

pub use models::{CampaignMember, MemberWithUser};
