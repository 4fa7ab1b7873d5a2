//! Public claim submission
//!
//! Field validation happens up front. Everything that depends on other
//! claims (invite redemption, duplicates, capacity) happens inside one
//! transaction holding the campaign row lock.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::utils::normalize_code;
use crate::common::{AppError, AppResult, ClaimId, QuestionId};
use crate::domains::campaigns::actions::{current_availability, find_public_campaign};
use crate::domains::campaigns::availability::{self, Availability, AvailabilityStatus};
use crate::domains::campaigns::Campaign;
use crate::domains::claims::models::{
    AnswerValue, Claim, ClaimAnswer, ClaimContact, ClaimSource, ClaimStatus, NewClaim,
};
use crate::domains::claims::validation::{validate_answers, validate_contact, FormRules};
use crate::domains::gifting::models::AdminGiftCode;
use crate::domains::invite_codes::models::InviteCode;
use crate::domains::questions::CampaignQuestion;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitClaimInput {
    #[serde(flatten)]
    pub contact: ClaimContact,
    pub invite_code: Option<String>,
    #[serde(default)]
    pub answers: HashMap<QuestionId, AnswerValue>,
}

/// What the visitor sees after submitting
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedClaim {
    pub claim_id: ClaimId,
    pub status: ClaimStatus,
    pub is_test_claim: bool,
    pub success_message: Option<String>,
}

/// What lets a visitor in
pub(crate) enum Admission {
    /// Regular form; the code is only checked when the campaign requires one
    Invite(Option<String>),
    /// Gift link; stands in for an invite code
    Gift(AdminGiftCode),
}

pub async fn submit_claim(
    slug: &str,
    input: SubmitClaimInput,
    deps: &ServerDeps,
) -> AppResult<SubmittedClaim> {
    let campaign = find_public_campaign(slug, &deps.db_pool).await?;
    admit(
        campaign,
        input.contact,
        input.answers,
        Admission::Invite(input.invite_code),
        deps,
    )
    .await
}

pub(crate) async fn admit(
    campaign: Campaign,
    contact: ClaimContact,
    answers: HashMap<QuestionId, AnswerValue>,
    admission: Admission,
    deps: &ServerDeps,
) -> AppResult<SubmittedClaim> {
    ensure_open(current_availability(&campaign, &deps.db_pool).await?)?;

    let contact =
        validate_contact(contact, FormRules::from(&campaign)).map_err(AppError::Validation)?;

    let invite_code = match &admission {
        Admission::Invite(code) if campaign.require_invite_code => {
            let code = code
                .as_deref()
                .map(normalize_code)
                .filter(|c| !c.is_empty())
                .ok_or_else(|| AppError::invalid("invite_code", "is required"))?;
            Some(code)
        }
        _ => None,
    };

    let questions = CampaignQuestion::find_for_campaign(campaign.id, &deps.db_pool).await?;
    let answers = validate_answers(&questions, answers).map_err(AppError::Validation)?;
    let fingerprint = contact.fingerprint();

    let mut tx = deps.db_pool.begin().await?;

    let campaign = Campaign::lock(campaign.id, &mut *tx)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;

    let invite_code_id = match invite_code {
        Some(code) => {
            let invite = InviteCode::redeem(campaign.id, &code, &mut *tx)
                .await?
                .ok_or_else(|| {
                    AppError::rejected(
                        "invalid_invite_code",
                        "That invite code is not valid or has been used up",
                    )
                })?;
            Some(invite.id)
        }
        None => None,
    };

    if let Admission::Gift(gift) = &admission {
        if !AdminGiftCode::record_use(gift.id, &mut *tx).await? {
            return Err(AppError::NotFound("Gift code"));
        }
    }

    let duplicate = Claim::find_duplicate(
        campaign.id,
        contact.email.as_deref(),
        fingerprint.as_deref(),
        None,
        &mut *tx,
    )
    .await?;
    if duplicate.is_some() {
        return Err(AppError::conflict(
            "already_claimed",
            "A claim for this email or address already exists",
        ));
    }

    let counted = Claim::count_toward_capacity(campaign.id, campaign.test_mode, &mut *tx).await?;
    ensure_open(availability::evaluate(&campaign, counted, Utc::now()))?;

    let mut new_claim = NewClaim::submitted(campaign.id, contact, ClaimSource::Form);
    new_claim.is_test_claim = campaign.test_mode;
    new_claim.fingerprint = fingerprint;
    new_claim.invite_code_id = invite_code_id;
    if let Admission::Gift(gift) = &admission {
        new_claim.source = ClaimSource::Gift;
        new_claim.gifted_by = Some(gift.admin_user_id);
        new_claim.gift_code_id = Some(gift.id);
        new_claim.gift_message = gift.message.clone();
    }

    let claim = Claim::insert(&new_claim, &mut *tx).await?;
    ClaimAnswer::save_all(claim.id, &answers, &mut tx).await?;

    tx.commit().await?;

    info!(
        claim_id = %claim.id,
        campaign_id = %campaign.id,
        source = %claim.source,
        is_test = claim.is_test_claim,
        "Claim submitted"
    );

    Ok(SubmittedClaim {
        claim_id: claim.id,
        status: claim.status,
        is_test_claim: claim.is_test_claim,
        success_message: campaign.success_message,
    })
}

/// Refuse submissions unless the campaign is open, with a code naming why.
pub fn ensure_open(availability: AvailabilityStatus) -> AppResult<()> {
    let (code, message) = match availability.status {
        Availability::Open => return Ok(()),
        Availability::Inactive => ("campaign_inactive", "This campaign is not active"),
        Availability::NotStarted => ("campaign_not_started", "This campaign has not started yet"),
        Availability::Ended => ("campaign_ended", "This campaign has ended"),
        Availability::Full => ("campaign_full", "This campaign is full"),
    };
    Err(AppError::conflict(code, message))
}
