pub mod answer;
pub mod claim;

pub use answer::{AnswerValue, ClaimAnswer};
pub use claim::{
    Claim, ClaimContact, ClaimCounts, ClaimFilter, ClaimSource, ClaimStatus, ClaimStatusRow,
    ExistingClaimMatch, NewClaim,
};
