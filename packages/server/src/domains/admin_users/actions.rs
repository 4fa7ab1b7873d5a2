//! Admin user actions
//!
//! Managing other admins requires the super admin role. Every admin may read
//! and edit their own profile.

use serde::Deserialize;
use tracing::info;

use crate::common::error::is_unique_violation;
use crate::common::utils::{clean, is_valid_email};
use crate::common::{
    Actor, AdminUserId, AppError, AppResult, FieldError, GlobalCapability, GlobalRole,
};
use crate::domains::admin_users::models::{AdminUser, CreateAdminUser, UpdateProfile};
use crate::domains::members::models::CampaignMember;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdminUserInput {
    pub email: String,
    pub display_name: Option<String>,
    pub role: Option<GlobalRole>,
}

pub async fn list_admin_users(actor: Actor, deps: &ServerDeps) -> AppResult<Vec<AdminUser>> {
    actor.can(GlobalCapability::ManageAdminUsers).check()?;
    Ok(AdminUser::find_all(&deps.db_pool).await?)
}

pub async fn create_admin_user(
    actor: Actor,
    input: CreateAdminUserInput,
    deps: &ServerDeps,
) -> AppResult<AdminUser> {
    actor.can(GlobalCapability::ManageAdminUsers).check()?;

    let email = input.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::invalid("email", "must be a valid email address"));
    }
    let display_name = clean(input.display_name).unwrap_or_else(|| default_display_name(&email));

    let created = AdminUser::create(
        CreateAdminUser {
            email: email.clone(),
            display_name,
            role: input.role.unwrap_or(GlobalRole::Admin),
        },
        &deps.db_pool,
    )
    .await;

    match created {
        Ok(user) => {
            info!(user_id = %user.id, role = %user.role, "Admin user created");
            Ok(user)
        }
        Err(e) if is_unique_violation(&e) => Err(AppError::conflict(
            "email_taken",
            format!("An admin user with email {} already exists", email),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn update_admin_role(
    actor: Actor,
    user_id: AdminUserId,
    role: GlobalRole,
    deps: &ServerDeps,
) -> AppResult<AdminUser> {
    actor.can(GlobalCapability::ManageAdminUsers).check()?;

    let mut tx = deps.db_pool.begin().await?;

    let super_admins = AdminUser::lock_super_admins(&mut *tx).await?;
    ensure_super_admin_remains(&super_admins, user_id, Some(role))?;

    let user = AdminUser::update_role(user_id, role, &mut *tx)
        .await?
        .ok_or(AppError::NotFound("Admin user"))?;

    tx.commit().await?;

    info!(user_id = %user_id, role = %role, changed_by = %actor.user_id, "Admin role updated");
    Ok(user)
}

pub async fn delete_admin_user(
    actor: Actor,
    user_id: AdminUserId,
    deps: &ServerDeps,
) -> AppResult<()> {
    actor.can(GlobalCapability::ManageAdminUsers).check()?;

    if user_id == actor.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    let sole_owned = CampaignMember::campaigns_solely_owned_by(user_id, &deps.db_pool).await?;
    if !sole_owned.is_empty() {
        return Err(AppError::conflict(
            "sole_owner",
            format!(
                "User is the only owner of: {}. Transfer ownership first.",
                sole_owned.join(", ")
            ),
        ));
    }

    let mut tx = deps.db_pool.begin().await?;

    let super_admins = AdminUser::lock_super_admins(&mut *tx).await?;
    ensure_super_admin_remains(&super_admins, user_id, None)?;

    if !AdminUser::delete(user_id, &mut *tx).await? {
        return Err(AppError::NotFound("Admin user"));
    }

    tx.commit().await?;

    info!(user_id = %user_id, deleted_by = %actor.user_id, "Admin user deleted");
    Ok(())
}

pub async fn get_me(actor: Actor, deps: &ServerDeps) -> AppResult<AdminUser> {
    AdminUser::find_by_id(actor.user_id, &deps.db_pool)
        .await?
        .ok_or(AppError::NotFound("Admin user"))
}

pub async fn update_me(
    actor: Actor,
    input: UpdateProfile,
    deps: &ServerDeps,
) -> AppResult<AdminUser> {
    let input = normalize_profile(input)?;

    AdminUser::update_profile(actor.user_id, input, &deps.db_pool)
        .await?
        .ok_or(AppError::NotFound("Admin user"))
}

/// Refuse any change that would leave the system without a super admin.
///
/// `new_role` is `None` when the user is being deleted.
pub fn ensure_super_admin_remains(
    super_admins: &[AdminUserId],
    target: AdminUserId,
    new_role: Option<GlobalRole>,
) -> AppResult<()> {
    let demoted = super_admins.contains(&target) && new_role != Some(GlobalRole::SuperAdmin);
    if demoted && super_admins.len() <= 1 {
        return Err(AppError::conflict(
            "last_super_admin",
            "At least one super admin must remain",
        ));
    }
    Ok(())
}

/// Trim every field. An absent field leaves the stored value alone and an
/// empty string clears it, except display name, which may never be blank.
fn normalize_profile(input: UpdateProfile) -> AppResult<UpdateProfile> {
    if let Some(name) = &input.display_name {
        if name.trim().is_empty() {
            return Err(AppError::Validation(vec![FieldError::new(
                "display_name",
                "cannot be blank",
            )]));
        }
    }

    let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
    Ok(UpdateProfile {
        display_name: trim(input.display_name),
        full_name: trim(input.full_name),
        phone: trim(input.phone),
        bio: trim(input.bio),
        avatar_url: trim(input.avatar_url),
        website: trim(input.website),
    })
}

fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_super_admin_cannot_be_demoted() {
        let only = AdminUserId::new();
        let err = ensure_super_admin_remains(&[only], only, Some(GlobalRole::Admin)).unwrap_err();
        assert!(matches!(
            err,
            AppError::Conflict {
                code: "last_super_admin",
                ..
            }
        ));
    }

    #[test]
    fn last_super_admin_cannot_be_deleted() {
        let only = AdminUserId::new();
        assert!(ensure_super_admin_remains(&[only], only, None).is_err());
    }

    #[test]
    fn one_of_two_super_admins_can_step_down() {
        let a = AdminUserId::new();
        let b = AdminUserId::new();
        assert!(ensure_super_admin_remains(&[a, b], a, Some(GlobalRole::Viewer)).is_ok());
    }

    #[test]
    fn other_users_are_unaffected() {
        let only = AdminUserId::new();
        let other = AdminUserId::new();
        assert!(ensure_super_admin_remains(&[only], other, None).is_ok());
        assert!(ensure_super_admin_remains(&[only], only, Some(GlobalRole::SuperAdmin)).is_ok());
    }

    #[test]
    fn blank_display_name_is_rejected() {
        let input = UpdateProfile {
            display_name: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(
            normalize_profile(input),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn profile_fields_are_trimmed_and_blanks_kept_for_clearing() {
        let input = UpdateProfile {
            bio: Some("  Sends kin everywhere  ".into()),
            website: Some("".into()),
            ..Default::default()
        };
        let cleaned = normalize_profile(input).unwrap();
        assert_eq!(cleaned.bio.as_deref(), Some("Sends kin everywhere"));
        assert_eq!(cleaned.website.as_deref(), Some(""));
        assert_eq!(cleaned.phone, None);
    }

    #[test]
    fn display_name_defaults_to_mailbox() {
        assert_eq!(default_display_name("ada@example.com"), "ada");
    }
}
