//! Draft/publish rules that don't need the database.

use super::models::VersionStatus;
use crate::common::CampaignVersionId;

/// Where a saved draft goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftSlot {
    /// Overwrite the existing draft in place
    Existing(CampaignVersionId),
    /// Create a new draft with this number
    New(i32),
}

/// A campaign holds at most one draft; saving reuses it, otherwise the next
/// number after the highest one ever used is taken.
pub fn draft_slot(draft: Option<CampaignVersionId>, max_version_number: i32) -> DraftSlot {
    match draft {
        Some(id) => DraftSlot::Existing(id),
        None => DraftSlot::New(max_version_number + 1),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertError {
    TargetIsDraft,
}

/// Only published versions can be reverted to.
pub fn check_revert_target(status: VersionStatus) -> Result<(), RevertError> {
    match status {
        VersionStatus::Published => Ok(()),
        VersionStatus::Draft => Err(RevertError::TargetIsDraft),
    }
}

pub fn revert_summary(version_number: i32) -> String {
    format!("Revert to version {}", version_number)
}
