use sqlx::PgPool;

use super::roles::{effective_campaign_role, GlobalRole, MemberRole};
use super::{AuthError, CampaignCapability, GlobalCapability};
use crate::common::entity_ids::{AdminUserId, CampaignId};
use crate::domains::members::models::CampaignMember;

/// Entry point for authorization checks
///
/// Usage:
/// ```rust,ignore
/// // Global check
/// actor.can(GlobalCapability::CreateCampaign).check()?;
///
/// // Campaign-scoped check, returns the effective role
/// actor
///     .on(campaign_id)
///     .can(CampaignCapability::EditClaims)
///     .check(&deps.db_pool)
///     .await?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: AdminUserId,
    pub role: GlobalRole,
}

impl Actor {
    pub fn new(user_id: AdminUserId, role: GlobalRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == GlobalRole::SuperAdmin
    }

    /// Specify a global capability the actor needs
    pub fn can(self, capability: GlobalCapability) -> GlobalCheck {
        GlobalCheck {
            actor: self,
            capability,
        }
    }

    /// Scope the following capability to one campaign
    pub fn on(self, campaign_id: CampaignId) -> CampaignScope {
        CampaignScope {
            actor: self,
            campaign_id,
        }
    }
}

/// Builder after specifying a global capability
pub struct GlobalCheck {
    actor: Actor,
    capability: GlobalCapability,
}

impl GlobalCheck {
    pub fn check(self) -> Result<(), AuthError> {
        if self.capability.permits(self.actor.role) {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied(format!(
                "{:?} requires a higher global role than {}",
                self.capability, self.actor.role
            )))
        }
    }
}

pub struct CampaignScope {
    actor: Actor,
    campaign_id: CampaignId,
}

impl CampaignScope {
    pub fn can(self, capability: CampaignCapability) -> CampaignCheck {
        CampaignCheck {
            actor: self.actor,
            campaign_id: self.campaign_id,
            capability,
        }
    }
}

/// Builder after specifying a campaign capability
pub struct CampaignCheck {
    actor: Actor,
    campaign_id: CampaignId,
    capability: CampaignCapability,
}

impl CampaignCheck {
    /// Perform the authorization check, returning the effective role
    pub async fn check(self, pool: &PgPool) -> Result<MemberRole, AuthError> {
        let access = CampaignMember::access(self.campaign_id, self.actor.user_id, pool)
            .await?
            .ok_or(AuthError::CampaignNotFound)?;

        let is_creator = access.created_by == Some(self.actor.user_id);
        let role = effective_campaign_role(self.actor.role, access.membership, is_creator);

        authorize_campaign(role, self.capability)
    }
}

/// Decide a campaign capability for an already resolved role.
///
/// Actors with no role at all get `CampaignNotFound` so campaign existence
/// is not leaked to admins outside it.
pub fn authorize_campaign(
    role: Option<MemberRole>,
    capability: CampaignCapability,
) -> Result<MemberRole, AuthError> {
    match role {
        None => Err(AuthError::CampaignNotFound),
        Some(role) if capability.permits(role) => Ok(role),
        Some(role) => Err(AuthError::PermissionDenied(format!(
            "{:?} requires {} access, you have {}",
            capability,
            capability.minimum_role(),
            role
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_check_for_admin() {
        let actor = Actor::new(AdminUserId::new(), GlobalRole::Admin);
        assert!(actor.can(GlobalCapability::CreateCampaign).check().is_ok());
        assert!(matches!(
            actor.can(GlobalCapability::ManageAdminUsers).check(),
            Err(AuthError::PermissionDenied(_))
        ));
    }

    #[test]
    fn outsiders_see_not_found() {
        assert!(matches!(
            authorize_campaign(None, CampaignCapability::View),
            Err(AuthError::CampaignNotFound)
        ));
    }

    #[test]
    fn insufficient_role_is_denied() {
        let result = authorize_campaign(Some(MemberRole::Viewer), CampaignCapability::EditClaims);
        match result {
            Err(AuthError::PermissionDenied(msg)) => assert!(msg.contains("editor")),
            other => panic!("expected denial, got {:?}", other),
        }
    }

    #[test]
    fn sufficient_role_is_returned() {
        let role = authorize_campaign(Some(MemberRole::Owner), CampaignCapability::DeleteCampaign)
            .unwrap();
        assert_eq!(role, MemberRole::Owner);
    }
}
