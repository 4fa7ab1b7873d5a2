crate::text_enum! {
    /// Global role of an admin user, independent of any campaign.
    pub enum GlobalRole {
        SuperAdmin => "super_admin",
        Admin => "admin",
        Viewer => "viewer",
    }
}

crate::text_enum! {
    /// Per-campaign membership role.
    pub enum MemberRole {
        Owner => "owner",
        Editor => "editor",
        Viewer => "viewer",
    }
}

impl MemberRole {
    fn rank(self) -> u8 {
        match self {
            MemberRole::Viewer => 0,
            MemberRole::Editor => 1,
            MemberRole::Owner => 2,
        }
    }

    /// Whether this role grants at least the privileges of `other`.
    pub fn at_least(self, other: MemberRole) -> bool {
        self.rank() >= other.rank()
    }
}

/// Resolve the role an admin effectively holds on one campaign.
///
/// Super admins act as owners everywhere. Global viewers never exceed viewer,
/// whatever their membership says. A creator without a membership row (rows
/// can be removed by hand) is still treated as an owner.
pub fn effective_campaign_role(
    global: GlobalRole,
    membership: Option<MemberRole>,
    is_creator: bool,
) -> Option<MemberRole> {
    let direct = membership.or(is_creator.then_some(MemberRole::Owner));

    match global {
        GlobalRole::SuperAdmin => Some(MemberRole::Owner),
        GlobalRole::Admin => direct,
        GlobalRole::Viewer => direct.map(|_| MemberRole::Viewer),
    }
}
