use super::roles::{GlobalRole, MemberRole};

/// Operations gated by the actor's global role alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalCapability {
    /// Create new campaigns (admin and above)
    CreateCampaign,

    /// Invite, promote, demote and delete admin users
    ManageAdminUsers,
}

impl GlobalCapability {
    pub fn permits(&self, role: GlobalRole) -> bool {
        match self {
            GlobalCapability::CreateCampaign => {
                matches!(role, GlobalRole::SuperAdmin | GlobalRole::Admin)
            }
            GlobalCapability::ManageAdminUsers => role == GlobalRole::SuperAdmin,
        }
    }
}

/// Operations scoped to one campaign, gated by the effective member role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignCapability {
    View,
    ExportClaims,
    EditClaims,
    EditCampaign,
    PublishVersion,
    ManageInviteCodes,
    ManageQuestions,
    ManageGiftCodes,
    ImportClaims,
    ManageMembers,
    DeleteCampaign,
}

impl CampaignCapability {
    pub fn minimum_role(&self) -> MemberRole {
        use CampaignCapability::*;

        match self {
            View | ExportClaims => MemberRole::Viewer,
            EditClaims | EditCampaign | PublishVersion | ManageInviteCodes | ManageQuestions
            | ManageGiftCodes | ImportClaims => MemberRole::Editor,
            ManageMembers | DeleteCampaign => MemberRole::Owner,
        }
    }

    pub fn permits(&self, role: MemberRole) -> bool {
        role.at_least(self.minimum_role())
    }
}
