//! Test fixtures for creating test data.
//!
//! Admin users go through the model directly; campaigns go through the
//! create action so they get a published first version like real ones.

use kin_core::common::{Actor, GlobalRole};
use kin_core::domains::admin_users::models::{AdminUser, CreateAdminUser};
use kin_core::domains::campaigns::actions::{self as campaigns, CreateCampaignInput};
use kin_core::domains::campaigns::settings::CampaignSettings;
use kin_core::domains::campaigns::Campaign;
use kin_core::domains::claims::models::ClaimContact;
use kin_core::kernel::ServerDeps;
use sqlx::PgPool;
use uuid::Uuid;

/// Short random suffix for slugs and emails in the shared database
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

pub async fn create_admin(pool: &PgPool, role: GlobalRole) -> AdminUser {
    let email = format!("{}@kin.test", unique("admin"));
    AdminUser::create(
        CreateAdminUser {
            display_name: email.clone(),
            email,
            role,
        },
        pool,
    )
    .await
    .expect("Failed to create admin user")
}

pub fn actor(user: &AdminUser) -> Actor {
    Actor::new(user.id, user.role)
}

/// Active campaign with default rules; `tweak` adjusts the settings first
pub async fn create_campaign(
    deps: &ServerDeps,
    owner: &AdminUser,
    tweak: impl FnOnce(&mut CampaignSettings),
) -> Campaign {
    let mut settings = CampaignSettings {
        title: "Cognitive Kin Stickers".to_string(),
        ..CampaignSettings::default()
    };
    tweak(&mut settings);

    campaigns::create_campaign(
        actor(owner),
        CreateCampaignInput {
            slug: unique("kin"),
            is_active: true,
            settings,
        },
        deps,
    )
    .await
    .expect("Failed to create campaign")
}

/// A complete US contact; `street` varies the address fingerprint
pub fn contact(name: &str, email: &str, street: &str) -> ClaimContact {
    ClaimContact {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        address_line1: Some(street.to_string()),
        city: Some("Portland".to_string()),
        region: Some("OR".to_string()),
        postal_code: Some("97201".to_string()),
        country: Some("US".to_string()),
        ..ClaimContact::default()
    }
}

pub fn unique_email() -> String {
    format!("{}@example.org", unique("kin"))
}
