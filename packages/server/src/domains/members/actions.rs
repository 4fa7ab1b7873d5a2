use serde::Deserialize;
use tracing::info;

use crate::common::{
    Actor, AdminUserId, AppError, AppResult, CampaignCapability, CampaignId, GlobalRole,
    MemberRole,
};
use crate::domains::admin_users::models::AdminUser;
use crate::domains::members::models::{CampaignMember, MemberWithUser};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Deserialize)]
pub struct SetMemberInput {
    pub user_id: AdminUserId,
    pub role: MemberRole,
}

pub async fn list_members(
    actor: Actor,
    campaign_id: CampaignId,
    deps: &ServerDeps,
) -> AppResult<Vec<MemberWithUser>> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::View)
        .check(&deps.db_pool)
        .await?;

    Ok(CampaignMember::find_for_campaign(campaign_id, &deps.db_pool).await?)
}

/// Add a member or change an existing member's role
pub async fn set_member(
    actor: Actor,
    campaign_id: CampaignId,
    input: SetMemberInput,
    deps: &ServerDeps,
) -> AppResult<CampaignMember> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::ManageMembers)
        .check(&deps.db_pool)
        .await?;

    let target = AdminUser::find_by_id(input.user_id, &deps.db_pool)
        .await?
        .ok_or(AppError::NotFound("Admin user"))?;

    check_role_for_global(target.role, input.role)?;

    let mut tx = deps.db_pool.begin().await?;

    let owners = CampaignMember::lock_owners(campaign_id, &mut *tx).await?;
    ensure_owner_remains(&owners, input.user_id, Some(input.role))?;

    let member = CampaignMember::upsert(
        campaign_id,
        input.user_id,
        input.role,
        Some(actor.user_id),
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        user_id = %input.user_id,
        role = %input.role,
        "Campaign member set"
    );
    Ok(member)
}

pub async fn remove_member(
    actor: Actor,
    campaign_id: CampaignId,
    user_id: AdminUserId,
    deps: &ServerDeps,
) -> AppResult<()> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::ManageMembers)
        .check(&deps.db_pool)
        .await?;

    let mut tx = deps.db_pool.begin().await?;

    let owners = CampaignMember::lock_owners(campaign_id, &mut *tx).await?;
    ensure_owner_remains(&owners, user_id, None)?;

    if !CampaignMember::remove(campaign_id, user_id, &mut *tx).await? {
        return Err(AppError::NotFound("Campaign member"));
    }

    tx.commit().await?;

    info!(campaign_id = %campaign_id, user_id = %user_id, "Campaign member removed");
    Ok(())
}

/// Global viewers can only ever be campaign viewers.
pub fn check_role_for_global(global: GlobalRole, role: MemberRole) -> AppResult<()> {
    if global == GlobalRole::Viewer && role != MemberRole::Viewer {
        return Err(AppError::invalid(
            "role",
            "users with the global viewer role can only be campaign viewers",
        ));
    }
    Ok(())
}

/// Every campaign keeps at least one owner.
///
/// `new_role` is `None` when the member is being removed.
pub fn ensure_owner_remains(
    owners: &[AdminUserId],
    target: AdminUserId,
    new_role: Option<MemberRole>,
) -> AppResult<()> {
    let demoted = owners.contains(&target) && new_role != Some(MemberRole::Owner);
    if demoted && owners.len() <= 1 {
        return Err(AppError::conflict(
            "last_owner",
            "A campaign must keep at least one owner",
        ));
    }
    Ok(())
}
