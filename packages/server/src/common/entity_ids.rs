//! Typed ID definitions for all domain entities.
//!
//! Marker types live in their own module so they never shadow the model
//! structs of the same name (`domains::claims::Claim` and friends).

pub use super::id::Id;

pub mod markers {
    pub struct AdminUser;
    pub struct Campaign;
    pub struct CampaignVersion;
    pub struct Claim;
    pub struct ClaimAnswer;
    pub struct InviteCode;
    pub struct CampaignQuestion;
    pub struct AdminGiftCode;
}

pub type AdminUserId = Id<markers::AdminUser>;
pub type CampaignId = Id<markers::Campaign>;
pub type CampaignVersionId = Id<markers::CampaignVersion>;
pub type ClaimId = Id<markers::Claim>;
pub type ClaimAnswerId = Id<markers::ClaimAnswer>;
pub type InviteCodeId = Id<markers::InviteCode>;
pub type QuestionId = Id<markers::CampaignQuestion>;
pub type GiftCodeId = Id<markers::AdminGiftCode>;
