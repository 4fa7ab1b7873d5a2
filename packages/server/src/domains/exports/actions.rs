use chrono::Utc;
use tracing::info;

use crate::common::{Actor, AppError, AppResult, CampaignCapability, CampaignId};
use crate::domains::campaigns::actions::find_campaign;
use crate::domains::claims::models::{Claim, ClaimAnswer, ClaimFilter};
use crate::domains::exports::sheet::{export_filename, render_claims};
use crate::domains::questions::CampaignQuestion;
use crate::kernel::ServerDeps;

/// A rendered CSV ready to be sent as an attachment
#[derive(Debug, Clone)]
pub struct ClaimExport {
    pub filename: String,
    pub body: String,
    pub rows: usize,
}

/// Every claim matching the list filters, as CSV
pub async fn export_claims(
    actor: Actor,
    campaign_id: CampaignId,
    filter: ClaimFilter,
    deps: &ServerDeps,
) -> AppResult<ClaimExport> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::ExportClaims)
        .check(&deps.db_pool)
        .await?;

    let campaign = find_campaign(campaign_id, &deps.db_pool).await?;
    let questions = CampaignQuestion::find_for_campaign(campaign_id, &deps.db_pool).await?;
    let claims = Claim::find_all_filtered(campaign_id, &filter, &deps.db_pool).await?;

    let ids: Vec<_> = claims.iter().map(|c| c.id).collect();
    let answers = ClaimAnswer::find_for_claims(&ids, &deps.db_pool).await?;

    let body = render_claims(&questions, &claims, answers).map_err(AppError::Internal)?;

    info!(
        campaign_id = %campaign_id,
        rows = claims.len(),
        exported_by = %actor.user_id,
        "Claims exported"
    );

    Ok(ClaimExport {
        filename: export_filename(&campaign.slug, Utc::now().date_naive()),
        body,
        rows: claims.len(),
    })
}
