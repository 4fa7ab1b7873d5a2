//! Campaign version actions
//!
//! Every write locks the campaign row first so concurrent editors queue up
//! behind each other instead of racing for the single draft slot.

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use tracing::info;

use crate::common::{Actor, AppError, AppResult, CampaignCapability, CampaignId};
use crate::domains::campaigns::models::Campaign;
use crate::domains::campaigns::CampaignSettings;
use crate::domains::versions::lifecycle::{
    check_revert_target, draft_slot, revert_summary, DraftSlot, RevertError,
};
use crate::domains::versions::models::CampaignVersion;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Deserialize)]
pub struct SaveDraftInput {
    pub settings: CampaignSettings,
    pub change_summary: Option<String>,
    #[serde(default)]
    pub publish: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishedVersion {
    pub campaign: Campaign,
    pub version: CampaignVersion,
}

pub async fn save_draft(
    actor: Actor,
    campaign_id: CampaignId,
    input: SaveDraftInput,
    deps: &ServerDeps,
) -> AppResult<CampaignVersion> {
    let capability = if input.publish {
        CampaignCapability::PublishVersion
    } else {
        CampaignCapability::EditCampaign
    };
    actor
        .on(campaign_id)
        .can(capability)
        .check(&deps.db_pool)
        .await?;

    let settings = input.settings.normalized();
    settings.validate().map_err(AppError::Validation)?;
    let summary = input
        .change_summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let mut tx = deps.db_pool.begin().await?;
    lock_campaign(campaign_id, &mut tx).await?;

    let draft = upsert_draft(campaign_id, &settings, summary.as_deref(), actor, &mut tx).await?;

    let version = if input.publish {
        publish(draft, actor, &mut tx).await?.version
    } else {
        draft
    };

    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        version = version.version_number,
        status = %version.status,
        "Campaign draft saved"
    );
    Ok(version)
}

pub async fn publish_draft(
    actor: Actor,
    campaign_id: CampaignId,
    deps: &ServerDeps,
) -> AppResult<PublishedVersion> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::PublishVersion)
        .check(&deps.db_pool)
        .await?;

    let mut tx = deps.db_pool.begin().await?;
    lock_campaign(campaign_id, &mut tx).await?;

    let draft = CampaignVersion::find_draft(campaign_id, &mut *tx)
        .await?
        .ok_or(AppError::NotFound("Draft"))?;
    let published = publish(draft, actor, &mut tx).await?;

    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        version = published.version.version_number,
        published_by = %actor.user_id,
        "Campaign version published"
    );
    Ok(published)
}

pub async fn discard_draft(
    actor: Actor,
    campaign_id: CampaignId,
    deps: &ServerDeps,
) -> AppResult<()> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::EditCampaign)
        .check(&deps.db_pool)
        .await?;

    let mut tx = deps.db_pool.begin().await?;
    lock_campaign(campaign_id, &mut tx).await?;

    let draft = CampaignVersion::find_draft(campaign_id, &mut *tx)
        .await?
        .ok_or(AppError::NotFound("Draft"))?;
    CampaignVersion::delete(draft.id, &mut *tx).await?;

    tx.commit().await?;

    info!(campaign_id = %campaign_id, version = draft.version_number, "Draft discarded");
    Ok(())
}

/// Load an earlier version's settings into the draft. Publishing it is a
/// separate step.
pub async fn revert_to_version(
    actor: Actor,
    campaign_id: CampaignId,
    version_number: i32,
    deps: &ServerDeps,
) -> AppResult<CampaignVersion> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::EditCampaign)
        .check(&deps.db_pool)
        .await?;

    let mut tx = deps.db_pool.begin().await?;
    lock_campaign(campaign_id, &mut tx).await?;

    let target = CampaignVersion::find_by_number(campaign_id, version_number, &mut *tx)
        .await?
        .ok_or(AppError::NotFound("Version"))?;
    check_revert_target(target.status).map_err(|e| match e {
        RevertError::TargetIsDraft => {
            AppError::BadRequest("Cannot revert to the current draft".to_string())
        }
    })?;

    let summary = revert_summary(version_number);
    let draft = upsert_draft(campaign_id, target.settings(), Some(&summary), actor, &mut tx).await?;

    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        from_version = version_number,
        draft_version = draft.version_number,
        "Draft reverted"
    );
    Ok(draft)
}

pub async fn list_versions(
    actor: Actor,
    campaign_id: CampaignId,
    deps: &ServerDeps,
) -> AppResult<Vec<CampaignVersion>> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::View)
        .check(&deps.db_pool)
        .await?;

    Ok(CampaignVersion::find_all(campaign_id, &deps.db_pool).await?)
}

pub async fn get_draft(
    actor: Actor,
    campaign_id: CampaignId,
    deps: &ServerDeps,
) -> AppResult<CampaignVersion> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::View)
        .check(&deps.db_pool)
        .await?;

    CampaignVersion::find_draft(campaign_id, &deps.db_pool)
        .await?
        .ok_or(AppError::NotFound("Draft"))
}

async fn lock_campaign(campaign_id: CampaignId, conn: &mut PgConnection) -> AppResult<Campaign> {
    Campaign::lock(campaign_id, conn)
        .await?
        .ok_or(AppError::NotFound("Campaign"))
}

async fn upsert_draft(
    campaign_id: CampaignId,
    settings: &CampaignSettings,
    summary: Option<&str>,
    actor: Actor,
    conn: &mut PgConnection,
) -> AppResult<CampaignVersion> {
    let existing = CampaignVersion::find_draft(campaign_id, &mut *conn).await?;
    let max = CampaignVersion::max_version_number(campaign_id, &mut *conn).await?;

    let version = match draft_slot(existing.map(|d| d.id), max) {
        DraftSlot::Existing(id) => {
            CampaignVersion::update_draft(id, settings, summary, &mut *conn).await?
        }
        DraftSlot::New(number) => {
            CampaignVersion::insert_draft(
                campaign_id,
                number,
                settings,
                summary,
                actor.user_id,
                &mut *conn,
            )
            .await?
        }
    };
    Ok(version)
}

async fn publish(
    draft: CampaignVersion,
    actor: Actor,
    conn: &mut PgConnection,
) -> AppResult<PublishedVersion> {
    let version = CampaignVersion::mark_published(draft.id, actor.user_id, &mut *conn).await?;
    let campaign = Campaign::apply_settings(
        version.campaign_id,
        version.settings(),
        version.version_number,
        &mut *conn,
    )
    .await?;
    Ok(PublishedVersion { campaign, version })
}
