//! Capacity accounting.
//!
//! A claim occupies a slot unless it was rejected. Test claims only occupy
//! slots while the campaign is in test mode. `Claim::count_toward_capacity`
//! is the SQL form of `counts_toward_capacity`.

use super::models::ClaimStatus;

pub fn counts_toward_capacity(status: ClaimStatus, is_test_claim: bool, test_mode: bool) -> bool {
    status != ClaimStatus::Rejected && (!is_test_claim || test_mode)
}

/// Whether `requested` more claims fit. Unlimited campaigns always have room.
pub fn has_room(capacity_total: Option<i32>, counted: i64, requested: i64) -> bool {
    match capacity_total {
        None => true,
        Some(total) => counted + requested <= i64::from(total),
    }
}

/// Moving a claim out of `rejected` takes a slot again.
pub fn reclaims_slot(from: ClaimStatus, to: ClaimStatus) -> bool {
    from == ClaimStatus::Rejected && to != ClaimStatus::Rejected
}
