//! Admin-side claim management: listing, editing, fulfillment, deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::utils::{clean, is_valid_email};
use crate::common::{
    Actor, AppError, AppResult, CampaignCapability, CampaignId, ClaimId, Page, PaginationArgs,
};
use crate::domains::campaigns::Campaign;
use crate::domains::claims::capacity::{counts_toward_capacity, has_room, reclaims_slot};
use crate::domains::claims::models::{
    Claim, ClaimAnswer, ClaimContact, ClaimFilter, ClaimStatus,
};
use crate::domains::claims::shipping::{plan_shipment, SkippedClaim};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Serialize)]
pub struct ClaimWithAnswers {
    #[serde(flatten)]
    pub claim: Claim,
    pub answers: Vec<ClaimAnswer>,
}

/// Admin edit; omitted fields stay as they are, blank strings clear them
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClaimInput {
    pub status: Option<ClaimStatus>,
    pub admin_notes: Option<String>,
    #[serde(flatten)]
    pub contact: ClaimContact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShipClaimsInput {
    pub claim_ids: Vec<ClaimId>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipmentReport {
    pub shipped: u64,
    /// Pending claims confirmed on the way out
    pub confirmed: Vec<ClaimId>,
    pub skipped: Vec<SkippedClaim>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimIdsInput {
    pub claim_ids: Vec<ClaimId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedCount {
    pub deleted: u64,
}

pub async fn list_claims(
    actor: Actor,
    campaign_id: CampaignId,
    filter: ClaimFilter,
    pagination: PaginationArgs,
    deps: &ServerDeps,
) -> AppResult<Page<Claim>> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::View)
        .check(&deps.db_pool)
        .await?;

    let args = pagination
        .validate()
        .map_err(|msg| AppError::invalid("after", msg))?;

    let rows = Claim::find_page(campaign_id, &filter, &args, &deps.db_pool).await?;
    let total = Claim::count_filtered(campaign_id, &filter, &deps.db_pool).await?;

    Ok(Page::from_fetch(rows, &args, total, |c| c.id.into_uuid()))
}

pub async fn get_claim(
    actor: Actor,
    campaign_id: CampaignId,
    claim_id: ClaimId,
    deps: &ServerDeps,
) -> AppResult<ClaimWithAnswers> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::View)
        .check(&deps.db_pool)
        .await?;

    let claim = Claim::find_in_campaign(claim_id, campaign_id, &deps.db_pool)
        .await?
        .ok_or(AppError::NotFound("Claim"))?;
    let answers = ClaimAnswer::find_for_claim(claim_id, &deps.db_pool).await?;

    Ok(ClaimWithAnswers { claim, answers })
}

pub async fn update_claim(
    actor: Actor,
    campaign_id: CampaignId,
    claim_id: ClaimId,
    input: UpdateClaimInput,
    deps: &ServerDeps,
) -> AppResult<Claim> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::EditClaims)
        .check(&deps.db_pool)
        .await?;

    let mut tx = deps.db_pool.begin().await?;

    let campaign = Campaign::lock(campaign_id, &mut *tx)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;
    let claim = Claim::find_in_campaign(claim_id, campaign_id, &mut *tx)
        .await?
        .ok_or(AppError::NotFound("Claim"))?;

    let contact = merge_contact(ClaimContact::from(&claim), input.contact);
    if matches!(&contact.email, Some(e) if !is_valid_email(e)) {
        return Err(AppError::invalid("email", "must be a valid email address"));
    }

    let status = input.status.unwrap_or(claim.status);
    if reclaims_slot(claim.status, status)
        && counts_toward_capacity(status, claim.is_test_claim, campaign.test_mode)
    {
        let counted =
            Claim::count_toward_capacity(campaign_id, campaign.test_mode, &mut *tx).await?;
        if !has_room(campaign.capacity_total, counted, 1) {
            return Err(AppError::conflict(
                "campaign_full",
                "No capacity left to restore this claim",
            ));
        }
    }

    let admin_notes = match input.admin_notes {
        Some(notes) => clean(Some(notes)),
        None => claim.admin_notes.clone(),
    };
    let fingerprint = contact.fingerprint();

    let updated = Claim::update_details(
        claim_id,
        &contact,
        fingerprint.as_deref(),
        status,
        admin_notes.as_deref(),
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(
        claim_id = %claim_id,
        from = %claim.status,
        to = %updated.status,
        updated_by = %actor.user_id,
        "Claim updated"
    );
    Ok(updated)
}

pub async fn ship_claims(
    actor: Actor,
    campaign_id: CampaignId,
    input: ShipClaimsInput,
    deps: &ServerDeps,
) -> AppResult<ShipmentReport> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::EditClaims)
        .check(&deps.db_pool)
        .await?;

    if input.claim_ids.is_empty() {
        return Err(AppError::invalid("claim_ids", "select at least one claim"));
    }

    let carrier = clean(input.carrier);
    let tracking_number = clean(input.tracking_number);
    let shipped_at = input.shipped_at.unwrap_or_else(Utc::now);

    let mut tx = deps.db_pool.begin().await?;

    let found = Claim::find_statuses(campaign_id, &input.claim_ids, &mut *tx).await?;
    let plan = plan_shipment(&input.claim_ids, &found);

    let shipped = if plan.to_ship.is_empty() {
        0
    } else {
        Claim::mark_shipped(
            &plan.to_ship,
            shipped_at,
            carrier.as_deref(),
            tracking_number.as_deref(),
            &mut *tx,
        )
        .await?
    };

    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        shipped,
        confirmed = plan.confirmed.len(),
        skipped = plan.skipped.len(),
        "Claims shipped"
    );

    Ok(ShipmentReport {
        shipped,
        confirmed: plan.confirmed,
        skipped: plan.skipped,
    })
}

pub async fn unship_claims(
    actor: Actor,
    campaign_id: CampaignId,
    input: ClaimIdsInput,
    deps: &ServerDeps,
) -> AppResult<u64> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::EditClaims)
        .check(&deps.db_pool)
        .await?;

    let cleared = Claim::clear_shipping(campaign_id, &input.claim_ids, &deps.db_pool).await?;

    info!(campaign_id = %campaign_id, cleared, "Shipping cleared");
    Ok(cleared)
}

pub async fn delete_claim(
    actor: Actor,
    campaign_id: CampaignId,
    claim_id: ClaimId,
    deps: &ServerDeps,
) -> AppResult<()> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::EditClaims)
        .check(&deps.db_pool)
        .await?;

    if !Claim::delete(claim_id, campaign_id, &deps.db_pool).await? {
        return Err(AppError::NotFound("Claim"));
    }

    info!(claim_id = %claim_id, deleted_by = %actor.user_id, "Claim deleted");
    Ok(())
}

/// Bulk delete. Clearing out test claims is an editor task; wiping every
/// claim needs the same role as deleting the campaign.
pub async fn delete_claims(
    actor: Actor,
    campaign_id: CampaignId,
    test_only: bool,
    deps: &ServerDeps,
) -> AppResult<DeletedCount> {
    let capability = if test_only {
        CampaignCapability::EditClaims
    } else {
        CampaignCapability::DeleteCampaign
    };
    actor
        .on(campaign_id)
        .can(capability)
        .check(&deps.db_pool)
        .await?;

    let deleted = Claim::delete_for_campaign(campaign_id, test_only, &deps.db_pool).await?;

    info!(
        campaign_id = %campaign_id,
        deleted,
        test_only,
        deleted_by = %actor.user_id,
        "Claims deleted"
    );
    Ok(DeletedCount { deleted })
}

/// Apply an admin patch to a claim's contact fields
pub fn merge_contact(current: ClaimContact, patch: ClaimContact) -> ClaimContact {
    fn pick(current: Option<String>, patch: Option<String>) -> Option<String> {
        match patch {
            Some(value) => clean(Some(value)),
            None => current,
        }
    }

    ClaimContact {
        name: pick(current.name, patch.name),
        email: pick(current.email, patch.email).map(|e| e.to_lowercase()),
        phone: pick(current.phone, patch.phone),
        address_line1: pick(current.address_line1, patch.address_line1),
        address_line2: pick(current.address_line2, patch.address_line2),
        city: pick(current.city, patch.city),
        region: pick(current.region, patch.region),
        postal_code: pick(current.postal_code, patch.postal_code),
        country: pick(current.country, patch.country).map(|c| c.to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_overrides_clears_and_keeps() {
        let current = ClaimContact {
            name: Some("Ada".into()),
            phone: Some("+1 555 0100".into()),
            city: Some("Portland".into()),
            ..Default::default()
        };
        let patch = ClaimContact {
            name: Some(" Ada Lovelace ".into()),
            phone: Some("".into()),
            email: Some("ADA@Example.com".into()),
            country: Some("ca".into()),
            ..Default::default()
        };

        let merged = merge_contact(current, patch);
        assert_eq!(merged.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(merged.phone, None);
        assert_eq!(merged.city.as_deref(), Some("Portland"));
        assert_eq!(merged.email.as_deref(), Some("ada@example.com"));
        assert_eq!(merged.country.as_deref(), Some("CA"));
    }

    #[test]
    fn update_input_accepts_status_and_fields() {
        let input: UpdateClaimInput =
            serde_json::from_str(r#"{"status":"confirmed","city":"Salem"}"#).unwrap();
        assert_eq!(input.status, Some(ClaimStatus::Confirmed));
        assert_eq!(input.contact.city.as_deref(), Some("Salem"));
        assert!(input.admin_notes.is_none());
    }
}
