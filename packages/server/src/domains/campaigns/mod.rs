//! Campaigns - configurable landing pages that collect address claims

pub mod actions;
pub mod availability;
pub mod models;
pub mod public;
pub mod settings;

pub use availability::{Availability, AvailabilityStatus};
pub use models::Campaign;
pub use settings::CampaignSettings;
