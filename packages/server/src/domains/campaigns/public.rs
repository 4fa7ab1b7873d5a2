//! What anonymous visitors may see of a campaign.

use serde::Serialize;

use super::availability::{Availability, AvailabilityStatus};
use super::models::Campaign;
use crate::common::QuestionId;
use crate::domains::questions::{CampaignQuestion, QuestionType};

#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: QuestionId,
    pub prompt: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub is_required: bool,
}

impl From<CampaignQuestion> for PublicQuestion {
    fn from(q: CampaignQuestion) -> Self {
        Self {
            id: q.id,
            prompt: q.prompt,
            question_type: q.question_type,
            options: q.options.0,
            is_required: q.is_required,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicCampaign {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub require_email: bool,
    pub require_phone: bool,
    pub require_invite_code: bool,
    pub allow_international: bool,
    pub kiosk_mode: bool,
    pub test_mode: bool,
    pub success_message: Option<String>,
    pub availability: Availability,
    /// Only disclosed when the campaign shows scarcity
    pub remaining: Option<i64>,
    pub questions: Vec<PublicQuestion>,
}

impl PublicCampaign {
    pub fn new(
        campaign: Campaign,
        availability: AvailabilityStatus,
        questions: Vec<CampaignQuestion>,
    ) -> Self {
        let remaining = if campaign.show_scarcity {
            availability.remaining
        } else {
            None
        };

        Self {
            slug: campaign.slug,
            title: campaign.title,
            description: campaign.description,
            require_email: campaign.require_email,
            require_phone: campaign.require_phone,
            require_invite_code: campaign.require_invite_code,
            allow_international: campaign.allow_international,
            kiosk_mode: campaign.kiosk_mode,
            test_mode: campaign.test_mode,
            success_message: campaign.success_message,
            availability: availability.status,
            remaining,
            questions: questions.into_iter().map(PublicQuestion::from).collect(),
        }
    }
}

/// Inactive campaigns are hidden from the public unless in test mode.
pub fn is_publicly_visible(campaign: &Campaign) -> bool {
    campaign.is_active || campaign.test_mode
}
