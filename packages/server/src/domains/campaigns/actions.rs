//! Campaign actions
//!
//! Settings changes go through versions (see `domains::versions`). The
//! actions here cover the lifecycle and the operational fields that live
//! outside versioning.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::common::error::is_unique_violation;
use crate::common::utils::slug_problem;
use crate::common::{
    Actor, AppError, AppResult, CampaignCapability, CampaignId, GlobalCapability, MemberRole,
};
use crate::domains::campaigns::availability::{self, AvailabilityStatus};
use crate::domains::campaigns::models::{Campaign, CampaignWithCounts};
use crate::domains::campaigns::public::{is_publicly_visible, PublicCampaign};
use crate::domains::campaigns::settings::CampaignSettings;
use crate::domains::claims::models::{Claim, ClaimCounts};
use crate::domains::members::models::CampaignMember;
use crate::domains::questions::models::{CampaignQuestion, QuestionFields};
use crate::domains::versions::models::CampaignVersion;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignInput {
    pub slug: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(flatten)]
    pub settings: CampaignSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCampaignInput {
    pub slug: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DuplicateCampaignInput {
    pub slug: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignSummary {
    #[serde(flatten)]
    pub campaign: CampaignWithCounts,
    pub availability: AvailabilityStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignDetail {
    pub campaign: Campaign,
    pub role: MemberRole,
    pub counts: ClaimCounts,
    pub availability: AvailabilityStatus,
    pub has_draft: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignStats {
    #[serde(flatten)]
    pub counts: ClaimCounts,
    pub remaining: Option<i64>,
}

pub async fn create_campaign(
    actor: Actor,
    input: CreateCampaignInput,
    deps: &ServerDeps,
) -> AppResult<Campaign> {
    actor.can(GlobalCapability::CreateCampaign).check()?;

    let slug = check_slug(&input.slug)?;
    let settings = input.settings.normalized();
    settings.validate().map_err(AppError::Validation)?;

    let campaign = insert_campaign(
        &slug,
        &settings,
        input.is_active,
        "Initial version",
        actor,
        &deps.db_pool,
    )
    .await?;

    info!(
        campaign_id = %campaign.id,
        slug = %campaign.slug,
        created_by = %actor.user_id,
        "Campaign created"
    );
    Ok(campaign)
}

pub async fn list_campaigns(actor: Actor, deps: &ServerDeps) -> AppResult<Vec<CampaignSummary>> {
    let now = Utc::now();
    let campaigns =
        Campaign::find_visible_to(actor.user_id, actor.is_super_admin(), &deps.db_pool).await?;

    Ok(campaigns
        .into_iter()
        .map(|row| {
            let availability = availability::evaluate(&row.campaign, row.counted_claims, now);
            CampaignSummary {
                campaign: row,
                availability,
            }
        })
        .collect())
}

pub async fn get_campaign(
    actor: Actor,
    campaign_id: CampaignId,
    deps: &ServerDeps,
) -> AppResult<CampaignDetail> {
    let role = actor
        .on(campaign_id)
        .can(CampaignCapability::View)
        .check(&deps.db_pool)
        .await?;

    let campaign = find_campaign(campaign_id, &deps.db_pool).await?;
    let counts = Claim::counts(campaign_id, campaign.test_mode, &deps.db_pool).await?;
    let availability = availability::evaluate(&campaign, counts.counted, Utc::now());
    let has_draft = CampaignVersion::find_draft(campaign_id, &deps.db_pool)
        .await?
        .is_some();

    Ok(CampaignDetail {
        campaign,
        role,
        counts,
        availability,
        has_draft,
    })
}

pub async fn update_campaign(
    actor: Actor,
    campaign_id: CampaignId,
    input: UpdateCampaignInput,
    deps: &ServerDeps,
) -> AppResult<Campaign> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::EditCampaign)
        .check(&deps.db_pool)
        .await?;

    let slug = input.slug.as_deref().map(check_slug).transpose()?;

    let updated =
        Campaign::update_operational(campaign_id, slug.as_deref(), input.is_active, &deps.db_pool)
            .await;

    match updated {
        Ok(Some(campaign)) => {
            info!(
                campaign_id = %campaign_id,
                slug = %campaign.slug,
                is_active = campaign.is_active,
                "Campaign updated"
            );
            Ok(campaign)
        }
        Ok(None) => Err(AppError::NotFound("Campaign")),
        Err(e) if is_unique_violation(&e) => Err(slug_taken(slug.as_deref().unwrap_or_default())),
        Err(e) => Err(e.into()),
    }
}

/// Delete a campaign that has no claims left
pub async fn delete_campaign(
    actor: Actor,
    campaign_id: CampaignId,
    deps: &ServerDeps,
) -> AppResult<()> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::DeleteCampaign)
        .check(&deps.db_pool)
        .await?;

    let mut tx = deps.db_pool.begin().await?;

    Campaign::lock(campaign_id, &mut *tx)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;

    if Claim::exists_for_campaign(campaign_id, &mut *tx).await? {
        return Err(AppError::conflict(
            "campaign_has_claims",
            "Delete the campaign's claims before deleting the campaign",
        ));
    }

    Campaign::delete(campaign_id, &mut *tx).await?;
    tx.commit().await?;

    info!(campaign_id = %campaign_id, deleted_by = %actor.user_id, "Campaign deleted");
    Ok(())
}

/// Copy settings and questions into a new, inactive campaign
pub async fn duplicate_campaign(
    actor: Actor,
    campaign_id: CampaignId,
    input: DuplicateCampaignInput,
    deps: &ServerDeps,
) -> AppResult<Campaign> {
    actor.can(GlobalCapability::CreateCampaign).check()?;
    actor
        .on(campaign_id)
        .can(CampaignCapability::View)
        .check(&deps.db_pool)
        .await?;

    let source = find_campaign(campaign_id, &deps.db_pool).await?;
    let slug = check_slug(&input.slug)?;

    let mut settings = source.settings();
    settings.title = input
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("{} (copy)", source.title));

    let questions = CampaignQuestion::find_for_campaign(campaign_id, &deps.db_pool).await?;

    let mut tx = deps.db_pool.begin().await?;
    let summary = format!("Copied from {}", source.slug);
    let copy = create_in_tx(&slug, &settings, false, &summary, actor, &mut tx).await?;

    for question in questions {
        let fields = QuestionFields {
            prompt: question.prompt,
            question_type: question.question_type,
            options: question.options.0,
            is_required: question.is_required,
        };
        CampaignQuestion::create(copy.id, &fields, &mut *tx).await?;
    }

    tx.commit().await?;

    info!(
        source_id = %campaign_id,
        campaign_id = %copy.id,
        slug = %copy.slug,
        "Campaign duplicated"
    );
    Ok(copy)
}

pub async fn campaign_stats(
    actor: Actor,
    campaign_id: CampaignId,
    deps: &ServerDeps,
) -> AppResult<CampaignStats> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::View)
        .check(&deps.db_pool)
        .await?;

    let campaign = find_campaign(campaign_id, &deps.db_pool).await?;
    let counts = Claim::counts(campaign_id, campaign.test_mode, &deps.db_pool).await?;
    let remaining = availability::evaluate(&campaign, counts.counted, Utc::now()).remaining;

    Ok(CampaignStats { counts, remaining })
}

/// Public campaign page by slug
pub async fn get_public_campaign(slug: &str, deps: &ServerDeps) -> AppResult<PublicCampaign> {
    let campaign = find_public_campaign(slug, &deps.db_pool).await?;
    let availability = current_availability(&campaign, &deps.db_pool).await?;
    let questions = CampaignQuestion::find_for_campaign(campaign.id, &deps.db_pool).await?;

    Ok(PublicCampaign::new(campaign, availability, questions))
}

pub(crate) async fn find_campaign(campaign_id: CampaignId, pool: &PgPool) -> AppResult<Campaign> {
    Campaign::find_by_id(campaign_id, pool)
        .await?
        .ok_or(AppError::NotFound("Campaign"))
}

/// Campaign by slug, hidden while inactive unless in test mode
pub(crate) async fn find_public_campaign(slug: &str, pool: &PgPool) -> AppResult<Campaign> {
    Campaign::find_by_slug(slug, pool)
        .await?
        .filter(is_publicly_visible)
        .ok_or(AppError::NotFound("Campaign"))
}

pub(crate) async fn current_availability(
    campaign: &Campaign,
    pool: &PgPool,
) -> AppResult<AvailabilityStatus> {
    let counted = Claim::count_toward_capacity(campaign.id, campaign.test_mode, pool).await?;
    Ok(availability::evaluate(campaign, counted, Utc::now()))
}

async fn insert_campaign(
    slug: &str,
    settings: &CampaignSettings,
    is_active: bool,
    summary: &str,
    actor: Actor,
    pool: &PgPool,
) -> AppResult<Campaign> {
    let mut tx = pool.begin().await?;
    let campaign = create_in_tx(slug, settings, is_active, summary, actor, &mut tx).await?;
    tx.commit().await?;
    Ok(campaign)
}

/// Campaign row, owner membership and published version 1
async fn create_in_tx(
    slug: &str,
    settings: &CampaignSettings,
    is_active: bool,
    summary: &str,
    actor: Actor,
    conn: &mut sqlx::PgConnection,
) -> AppResult<Campaign> {
    let created = Campaign::create(slug, settings, is_active, actor.user_id, &mut *conn).await;
    let campaign = match created {
        Ok(campaign) => campaign,
        Err(e) if is_unique_violation(&e) => return Err(slug_taken(slug)),
        Err(e) => return Err(e.into()),
    };

    CampaignMember::upsert(
        campaign.id,
        actor.user_id,
        MemberRole::Owner,
        Some(actor.user_id),
        &mut *conn,
    )
    .await?;
    CampaignVersion::insert_published(
        campaign.id,
        1,
        settings,
        Some(summary),
        actor.user_id,
        &mut *conn,
    )
    .await?;

    Ok(campaign)
}

fn check_slug(slug: &str) -> AppResult<String> {
    let slug = slug.trim().to_lowercase();
    match slug_problem(&slug) {
        Some(problem) => Err(AppError::invalid("slug", problem)),
        None => Ok(slug),
    }
}

fn slug_taken(slug: &str) -> AppError {
    AppError::conflict("slug_taken", format!("The slug '{}' is already in use", slug))
}
