//! Pre-created claims
//!
//! Admins reserve slots ahead of time and hand out a link per slot. The
//! recipient opens the link and fills in their own address.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::utils::{claim_token, clean, is_valid_email};
use crate::common::{
    Actor, AppError, AppResult, CampaignCapability, CampaignId, ClaimId, FieldError, QuestionId,
};
use crate::domains::admin_users::AdminUser;
use crate::domains::campaigns::actions::{current_availability, find_campaign};
use crate::domains::campaigns::public::PublicCampaign;
use crate::domains::campaigns::Campaign;
use crate::domains::claims::actions::submit::SubmittedClaim;
use crate::domains::claims::capacity::has_room;
use crate::domains::claims::models::{
    AnswerValue, Claim, ClaimAnswer, ClaimContact, ClaimSource, ClaimStatus, NewClaim,
};
use crate::domains::claims::validation::{validate_answers, validate_contact, FormRules};
use crate::domains::questions::CampaignQuestion;
use crate::kernel::ServerDeps;

pub const MAX_PRE_CREATE: u32 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct PreCreateClaimsInput {
    pub count: u32,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Setting a message marks the claims as gifts from the acting admin
    pub gift_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreCreatedClaim {
    pub claim_id: ClaimId,
    pub claim_token: String,
    pub link: String,
}

/// What a recipient sees when opening their link
#[derive(Debug, Clone, Serialize)]
pub struct ClaimTokenView {
    pub campaign: PublicCampaign,
    pub name: Option<String>,
    pub email: Option<String>,
    pub gift_message: Option<String>,
    pub gifted_by_name: Option<String>,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteClaimInput {
    #[serde(flatten)]
    pub contact: ClaimContact,
    #[serde(default)]
    pub answers: HashMap<QuestionId, AnswerValue>,
}

pub async fn pre_create_claims(
    actor: Actor,
    campaign_id: CampaignId,
    input: PreCreateClaimsInput,
    deps: &ServerDeps,
) -> AppResult<Vec<PreCreatedClaim>> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::EditClaims)
        .check(&deps.db_pool)
        .await?;

    let prefill = check_pre_create(&input).map_err(AppError::Validation)?;
    let gift_message = clean(input.gift_message);

    let mut tx = deps.db_pool.begin().await?;

    let campaign = Campaign::lock(campaign_id, &mut *tx)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;

    let counted = Claim::count_toward_capacity(campaign.id, campaign.test_mode, &mut *tx).await?;
    if !has_room(campaign.capacity_total, counted, i64::from(input.count)) {
        let remaining = campaign
            .capacity_total
            .map(|total| (i64::from(total) - counted).max(0))
            .unwrap_or_default();
        return Err(AppError::conflict(
            "campaign_full",
            format!("Only {} slots remain", remaining),
        ));
    }

    let mut created = Vec::with_capacity(input.count as usize);
    for _ in 0..input.count {
        let token = claim_token();
        let new_claim = NewClaim {
            campaign_id,
            contact: prefill.clone(),
            status: ClaimStatus::Pending,
            is_test_claim: campaign.test_mode,
            source: ClaimSource::PreCreated,
            fingerprint: None,
            claim_token: Some(token.clone()),
            pre_created_by: Some(actor.user_id),
            gifted_by: gift_message.as_ref().map(|_| actor.user_id),
            gift_code_id: None,
            gift_message: gift_message.clone(),
            invite_code_id: None,
            admin_notes: None,
            submitted_at: None,
        };
        let claim = Claim::insert(&new_claim, &mut *tx).await?;

        created.push(PreCreatedClaim {
            claim_id: claim.id,
            link: deps.claim_link(&token),
            claim_token: token,
        });
    }

    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        count = created.len(),
        gift = gift_message.is_some(),
        "Pre-created claims"
    );
    Ok(created)
}

pub async fn view_claim_by_token(token: &str, deps: &ServerDeps) -> AppResult<ClaimTokenView> {
    let claim = Claim::find_by_token(token, &deps.db_pool)
        .await?
        .ok_or(AppError::NotFound("Claim"))?;

    let campaign = find_campaign(claim.campaign_id, &deps.db_pool).await?;
    let availability = current_availability(&campaign, &deps.db_pool).await?;
    let questions = CampaignQuestion::find_for_campaign(campaign.id, &deps.db_pool).await?;

    let gifted_by_name = match claim.gifted_by {
        Some(id) => AdminUser::find_by_id(id, &deps.db_pool)
            .await?
            .map(|u| u.full_name.unwrap_or(u.display_name)),
        None => None,
    };

    Ok(ClaimTokenView {
        campaign: PublicCampaign::new(campaign, availability, questions),
        name: claim.name,
        email: claim.email,
        gift_message: claim.gift_message,
        gifted_by_name,
        completed: claim.submitted_at.is_some(),
    })
}

/// Fill in a pre-created claim. The slot is already reserved, so capacity
/// and invite codes are not checked again; single use.
pub async fn complete_claim_by_token(
    token: &str,
    input: CompleteClaimInput,
    deps: &ServerDeps,
) -> AppResult<SubmittedClaim> {
    let claim = Claim::find_by_token(token, &deps.db_pool)
        .await?
        .ok_or(AppError::NotFound("Claim"))?;
    if claim.submitted_at.is_some() {
        return Err(already_completed());
    }

    let campaign = find_campaign(claim.campaign_id, &deps.db_pool).await?;

    let contact =
        validate_contact(input.contact, FormRules::from(&campaign)).map_err(AppError::Validation)?;
    let questions = CampaignQuestion::find_for_campaign(campaign.id, &deps.db_pool).await?;
    let answers = validate_answers(&questions, input.answers).map_err(AppError::Validation)?;
    let fingerprint = contact.fingerprint();

    let mut tx = deps.db_pool.begin().await?;

    let locked = Claim::lock_by_token(token, &mut *tx)
        .await?
        .ok_or(AppError::NotFound("Claim"))?;
    if locked.submitted_at.is_some() {
        return Err(already_completed());
    }

    let duplicate = Claim::find_duplicate(
        campaign.id,
        contact.email.as_deref(),
        fingerprint.as_deref(),
        Some(locked.id),
        &mut *tx,
    )
    .await?;
    if duplicate.is_some() {
        return Err(AppError::conflict(
            "already_claimed",
            "A claim for this email or address already exists",
        ));
    }

    let completed = Claim::complete(locked.id, &contact, fingerprint.as_deref(), &mut *tx).await?;
    ClaimAnswer::save_all(completed.id, &answers, &mut tx).await?;

    tx.commit().await?;

    info!(
        claim_id = %completed.id,
        campaign_id = %campaign.id,
        "Pre-created claim completed"
    );

    Ok(SubmittedClaim {
        claim_id: completed.id,
        status: completed.status,
        is_test_claim: completed.is_test_claim,
        success_message: campaign.success_message,
    })
}

fn already_completed() -> AppError {
    AppError::conflict("already_completed", "This claim link has already been used")
}

/// Validate the batch size and the optional prefill
fn check_pre_create(input: &PreCreateClaimsInput) -> Result<ClaimContact, Vec<FieldError>> {
    let mut errors = Vec::new();

    if input.count == 0 || input.count > MAX_PRE_CREATE {
        errors.push(FieldError::new(
            "count",
            format!("must be between 1 and {}", MAX_PRE_CREATE),
        ));
    }

    let email = clean(input.email.clone()).map(|e| e.to_lowercase());
    if matches!(&email, Some(e) if !is_valid_email(e)) {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ClaimContact {
        name: clean(input.name.clone()),
        email,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(count: u32) -> PreCreateClaimsInput {
        PreCreateClaimsInput {
            count,
            name: None,
            email: None,
            gift_message: None,
        }
    }

    #[test]
    fn batch_size_is_bounded() {
        assert!(check_pre_create(&input(0)).is_err());
        assert!(check_pre_create(&input(501)).is_err());
        assert!(check_pre_create(&input(500)).is_ok());
    }

    #[test]
    fn prefill_is_cleaned() {
        let mut i = input(1);
        i.name = Some("  Ada  ".into());
        i.email = Some(" ADA@example.com".into());

        let prefill = check_pre_create(&i).unwrap();
        assert_eq!(prefill.name.as_deref(), Some("Ada"));
        assert_eq!(prefill.email.as_deref(), Some("ada@example.com"));
        assert!(prefill.address_line1.is_none());
    }

    #[test]
    fn bad_prefill_email_is_rejected() {
        let mut i = input(1);
        i.email = Some("nope".into());
        let errors = check_pre_create(&i).unwrap_err();
        assert_eq!(errors[0].field, "email");
    }
}
