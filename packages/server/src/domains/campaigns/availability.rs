use chrono::{DateTime, Utc};
use serde::Serialize;

use super::models::Campaign;

crate::text_enum! {
    /// Whether a campaign is accepting claims right now.
    pub enum Availability {
        Open => "open",
        Inactive => "inactive",
        NotStarted => "not_started",
        Ended => "ended",
        Full => "full",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailabilityStatus {
    pub status: Availability,
    /// Unclaimed slots; `None` when capacity is unlimited
    pub remaining: Option<i64>,
}

impl AvailabilityStatus {
    pub fn is_open(&self) -> bool {
        self.status == Availability::Open
    }
}

/// Evaluate availability. Checks run in a fixed order and the first
/// failing one wins: inactive, not started, ended, full.
///
/// Test-mode campaigns skip the active check so they can be tried out
/// before launch.
pub fn evaluate(campaign: &Campaign, counted: i64, now: DateTime<Utc>) -> AvailabilityStatus {
    let remaining = campaign
        .capacity_total
        .map(|total| (i64::from(total) - counted).max(0));

    let status = if !campaign.is_active && !campaign.test_mode {
        Availability::Inactive
    } else if campaign.starts_at.is_some_and(|starts| now < starts) {
        Availability::NotStarted
    } else if campaign.ends_at.is_some_and(|ends| now >= ends) {
        Availability::Ended
    } else if remaining == Some(0) {
        Availability::Full
    } else {
        Availability::Open
    };

    AvailabilityStatus { status, remaining }
}
