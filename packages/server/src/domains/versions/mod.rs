//! Campaign versions - draft/publish history of campaign settings

pub mod actions;
pub mod lifecycle;
pub mod models;

pub use models::{CampaignVersion, VersionStatus};
