/// Authorization for the admin API
///
/// Two layers decide what an admin may do: their global role and their
/// membership role on the campaign being touched. Actions express the check
/// fluently:
///
/// ```rust,ignore
/// actor
///     .on(campaign_id)
///     .can(CampaignCapability::PublishVersion)
///     .check(&deps.db_pool)
///     .await?;
/// ```

mod builder;
mod capability;
mod errors;
pub mod roles;

pub use builder::{authorize_campaign, Actor, CampaignCheck, CampaignScope, GlobalCheck};
pub use capability::{CampaignCapability, GlobalCapability};
pub use errors::AuthError;
pub use roles::{effective_campaign_role, GlobalRole, MemberRole};
