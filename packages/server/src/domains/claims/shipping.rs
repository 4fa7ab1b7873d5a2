use serde::Serialize;

use super::models::{ClaimStatus, ClaimStatusRow};
use crate::common::ClaimId;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedClaim {
    pub claim_id: ClaimId,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentPlan {
    pub to_ship: Vec<ClaimId>,
    /// Pending claims that get confirmed as part of shipping
    pub confirmed: Vec<ClaimId>,
    pub skipped: Vec<SkippedClaim>,
}

/// Split a bulk ship request. Rejected claims are never shipped; ids that
/// aren't in the campaign are reported as not found.
pub fn plan_shipment(requested: &[ClaimId], found: &[ClaimStatusRow]) -> ShipmentPlan {
    let mut plan = ShipmentPlan {
        to_ship: Vec::new(),
        confirmed: Vec::new(),
        skipped: Vec::new(),
    };

    for id in requested {
        if plan.to_ship.contains(id) || plan.skipped.iter().any(|s| s.claim_id == *id) {
            continue;
        }
        match found.iter().find(|row| row.id == *id).map(|row| row.status) {
            None => plan.skipped.push(SkippedClaim {
                claim_id: *id,
                reason: "not_found",
            }),
            Some(ClaimStatus::Rejected) => plan.skipped.push(SkippedClaim {
                claim_id: *id,
                reason: "rejected",
            }),
            Some(status) => {
                if status == ClaimStatus::Pending {
                    plan.confirmed.push(*id);
                }
                plan.to_ship.push(*id);
            }
        }
    }

    plan
}
