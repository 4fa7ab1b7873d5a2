//! Integration tests for the admin side of campaigns.
//!
//! Covers versioning, membership-based access, CSV import and export, and
//! the guards around deleting things that still matter.

mod common;

use std::collections::HashMap;

use common::{fixtures, TestHarness};
use kin_core::common::{AppError, AuthError, GlobalRole, MemberRole};
use kin_core::domains::admin_users::actions as admin_users;
use kin_core::domains::admin_users::{AdminUser, UpdateProfile};
use kin_core::domains::campaigns::actions::{self as campaigns, DuplicateCampaignInput};
use kin_core::domains::campaigns::CampaignSettings;
use kin_core::domains::claims::actions::{self as claims, SubmitClaimInput};
use kin_core::domains::claims::models::{ClaimFilter, ClaimSource};
use kin_core::domains::exports::actions as exports;
use kin_core::domains::imports::actions as imports;
use kin_core::domains::members::actions::{self as members, SetMemberInput};
use kin_core::domains::questions::actions::{self as questions, QuestionInput};
use kin_core::domains::questions::QuestionType;
use kin_core::domains::versions::actions::{self as versions, SaveDraftInput};
use kin_core::domains::versions::VersionStatus;
use test_context::test_context;

fn conflict_code(err: AppError) -> &'static str {
    match err {
        AppError::Conflict { code, .. } => code,
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn publishing_a_draft_applies_its_settings(ctx: &TestHarness) {
    let admin = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let actor = fixtures::actor(&admin);
    let campaign = fixtures::create_campaign(&ctx.deps, &admin, |_| {}).await;
    assert_eq!(campaign.current_version, Some(1));

    let mut settings = campaign.settings();
    settings.title = "Kin, Second Edition".into();
    settings.capacity_total = Some(250);

    let draft = versions::save_draft(
        actor,
        campaign.id,
        SaveDraftInput {
            settings,
            change_summary: Some("Bigger run".into()),
            publish: false,
        },
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(draft.version_number, 2);
    assert_eq!(draft.status, VersionStatus::Draft);

    // Draft changes stay off the live campaign until published
    let live = campaigns::get_campaign(actor, campaign.id, &ctx.deps).await.unwrap();
    assert_eq!(live.campaign.title, "Cognitive Kin Stickers");
    assert!(live.has_draft);

    let published = versions::publish_draft(actor, campaign.id, &ctx.deps).await.unwrap();
    assert_eq!(published.version.status, VersionStatus::Published);
    assert_eq!(published.campaign.title, "Kin, Second Edition");
    assert_eq!(published.campaign.capacity_total, Some(250));
    assert_eq!(published.campaign.current_version, Some(2));

    // Reverting loads version 1 into a fresh draft
    let reverted = versions::revert_to_version(actor, campaign.id, 1, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(reverted.version_number, 3);
    assert_eq!(reverted.data.0.title, "Cognitive Kin Stickers");

    let history = versions::list_versions(actor, campaign.id, &ctx.deps).await.unwrap();
    assert_eq!(history.len(), 3);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn campaign_roles_gate_admin_actions(ctx: &TestHarness) {
    let owner = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let outsider = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let viewer = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let campaign = fixtures::create_campaign(&ctx.deps, &owner, |_| {}).await;

    // Admins with no role cannot tell the campaign exists
    let err = campaigns::get_campaign(fixtures::actor(&outsider), campaign.id, &ctx.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(AuthError::CampaignNotFound)));

    members::set_member(
        fixtures::actor(&owner),
        campaign.id,
        SetMemberInput {
            user_id: viewer.id,
            role: MemberRole::Viewer,
        },
        &ctx.deps,
    )
    .await
    .unwrap();

    let detail = campaigns::get_campaign(fixtures::actor(&viewer), campaign.id, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(detail.role, MemberRole::Viewer);

    let err = questions::create_question(
        fixtures::actor(&viewer),
        campaign.id,
        QuestionInput {
            prompt: "Favorite thinker?".into(),
            question_type: QuestionType::Text,
            options: vec![],
            is_required: false,
        },
        &ctx.deps,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Auth(AuthError::PermissionDenied(_))));

    // The only owner cannot be demoted
    let err = members::set_member(
        fixtures::actor(&owner),
        campaign.id,
        SetMemberInput {
            user_id: owner.id,
            role: MemberRole::Editor,
        },
        &ctx.deps,
    )
    .await
    .unwrap_err();
    assert_eq!(conflict_code(err), "last_owner");
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn campaigns_with_claims_cannot_be_deleted(ctx: &TestHarness) {
    let admin = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let actor = fixtures::actor(&admin);
    let campaign = fixtures::create_campaign(&ctx.deps, &admin, |_| {}).await;

    claims::submit_claim(
        &campaign.slug,
        SubmitClaimInput {
            contact: fixtures::contact("Alan Turing", &fixtures::unique_email(), "1 Bletchley Pk"),
            invite_code: None,
            answers: HashMap::new(),
        },
        &ctx.deps,
    )
    .await
    .unwrap();

    let err = campaigns::delete_campaign(actor, campaign.id, &ctx.deps)
        .await
        .unwrap_err();
    match err {
        AppError::Conflict { code, .. } => assert_eq!(code, "campaign_has_claims"),
        other => panic!("expected conflict, got {:?}", other),
    }

    let removed = claims::delete_claims(actor, campaign.id, false, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(removed.deleted, 1);
    campaigns::delete_campaign(actor, campaign.id, &ctx.deps)
        .await
        .expect("empty campaign should delete");
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn duplicates_copy_settings_and_questions(ctx: &TestHarness) {
    let admin = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let actor = fixtures::actor(&admin);
    let campaign = fixtures::create_campaign(&ctx.deps, &admin, |s| {
        s.require_phone = true;
    })
    .await;

    questions::create_question(
        actor,
        campaign.id,
        QuestionInput {
            prompt: "Pick a color".into(),
            question_type: QuestionType::MultipleChoice,
            options: vec!["Red".into(), "Blue".into()],
            is_required: true,
        },
        &ctx.deps,
    )
    .await
    .unwrap();

    let slug = fixtures::unique("kin-copy");
    let copy = campaigns::duplicate_campaign(
        actor,
        campaign.id,
        DuplicateCampaignInput {
            slug: slug.clone(),
            title: None,
        },
        &ctx.deps,
    )
    .await
    .unwrap();

    assert_eq!(copy.slug, slug);
    assert!(!copy.is_active);
    assert!(copy.require_phone);
    assert_eq!(copy.title, "Cognitive Kin Stickers (copy)");

    let copied = questions::list_questions(actor, copy.id, &ctx.deps).await.unwrap();
    assert_eq!(copied.len(), 1);
    assert_eq!(copied[0].options.0, vec!["Red".to_string(), "Blue".to_string()]);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn csv_import_skips_duplicates_and_export_lists_claims(ctx: &TestHarness) {
    let admin = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let actor = fixtures::actor(&admin);
    let campaign = fixtures::create_campaign(&ctx.deps, &admin, |s: &mut CampaignSettings| {
        s.require_email = false;
    })
    .await;

    let email = fixtures::unique_email();
    let csv = format!(
        "First Name,Last Name,Email,Street Address,City,State,Zip\n\
         Ada,Lovelace,{email},1 Engine St,London,OR,97201\n\
         Ada,Again,{email},2 Engine St,London,OR,97201\n\
         ,,,3 Engine St,London,OR,97201\n",
        email = email
    );

    let preview = imports::import_claims(actor, campaign.id, &csv, true, &ctx.deps)
        .await
        .unwrap();
    assert!(preview.dry_run);
    assert_eq!(preview.rows, 3);
    assert_eq!(preview.imported, 1);
    assert_eq!(preview.duplicates.len(), 1);
    assert_eq!(preview.errors.len(), 1);

    let stats = campaigns::campaign_stats(actor, campaign.id, &ctx.deps).await.unwrap();
    assert_eq!(stats.counts.total, 0);

    let report = imports::import_claims(actor, campaign.id, &csv, false, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(report.imported, 1);

    let listed = claims::list_claims(
        actor,
        campaign.id,
        ClaimFilter::default(),
        Default::default(),
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].source, ClaimSource::Import);
    assert_eq!(listed.items[0].name.as_deref(), Some("Ada Lovelace"));

    let export = exports::export_claims(actor, campaign.id, ClaimFilter::default(), &ctx.deps)
        .await
        .unwrap();
    assert_eq!(export.rows, 1);
    assert!(export.filename.starts_with(&campaign.slug));
    assert!(export.body.contains("Ada Lovelace"));
    assert!(export.body.contains(&email));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn sole_owner_cannot_leave_or_be_demoted(ctx: &TestHarness) {
    let owner = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let successor = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let actor = fixtures::actor(&owner);
    let campaign = fixtures::create_campaign(&ctx.deps, &owner, |_| {}).await;

    let err = members::remove_member(actor, campaign.id, owner.id, &ctx.deps)
        .await
        .unwrap_err();
    assert_eq!(conflict_code(err), "last_owner");

    let err = members::set_member(
        actor,
        campaign.id,
        SetMemberInput {
            user_id: owner.id,
            role: MemberRole::Viewer,
        },
        &ctx.deps,
    )
    .await
    .unwrap_err();
    assert_eq!(conflict_code(err), "last_owner");

    // With a second owner in place the first may step away
    members::set_member(
        actor,
        campaign.id,
        SetMemberInput {
            user_id: successor.id,
            role: MemberRole::Owner,
        },
        &ctx.deps,
    )
    .await
    .unwrap();
    members::remove_member(actor, campaign.id, owner.id, &ctx.deps)
        .await
        .unwrap();

    let remaining = members::list_members(fixtures::actor(&successor), campaign.id, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);

    let err = members::remove_member(
        fixtures::actor(&successor),
        campaign.id,
        successor.id,
        &ctx.deps,
    )
    .await
    .unwrap_err();
    assert_eq!(conflict_code(err), "last_owner");
}

#[tokio::test]
#[ignore] // Requires Docker
async fn last_super_admin_is_kept() {
    // Super admins are counted across the whole table
    let ctx = TestHarness::isolated().await.expect("isolated database");
    let first = fixtures::create_admin(&ctx.db_pool, GlobalRole::SuperAdmin).await;
    let second = fixtures::create_admin(&ctx.db_pool, GlobalRole::SuperAdmin).await;
    let stale_second = fixtures::actor(&second);

    admin_users::update_admin_role(fixtures::actor(&first), second.id, GlobalRole::Admin, &ctx.deps)
        .await
        .unwrap();

    let err = admin_users::update_admin_role(
        fixtures::actor(&first),
        first.id,
        GlobalRole::Admin,
        &ctx.deps,
    )
    .await
    .unwrap_err();
    assert_eq!(conflict_code(err), "last_super_admin");

    // An actor resolved before the demotion still cannot remove the last one
    let err = admin_users::delete_admin_user(stale_second, first.id, &ctx.deps)
        .await
        .unwrap_err();
    assert_eq!(conflict_code(err), "last_super_admin");

    let still_there = AdminUser::find_by_id(first.id, &ctx.db_pool).await.unwrap();
    assert_eq!(still_there.map(|u| u.role), Some(GlobalRole::SuperAdmin));

    admin_users::update_admin_role(
        fixtures::actor(&first),
        second.id,
        GlobalRole::SuperAdmin,
        &ctx.deps,
    )
    .await
    .unwrap();
    let demoted = admin_users::update_admin_role(
        fixtures::actor(&first),
        first.id,
        GlobalRole::Admin,
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(demoted.role, GlobalRole::Admin);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn sole_owners_cannot_be_deleted(ctx: &TestHarness) {
    let root = fixtures::create_admin(&ctx.db_pool, GlobalRole::SuperAdmin).await;
    let owner = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let campaign = fixtures::create_campaign(&ctx.deps, &owner, |_| {}).await;

    let err = admin_users::delete_admin_user(fixtures::actor(&root), owner.id, &ctx.deps)
        .await
        .unwrap_err();
    match err {
        AppError::Conflict { code, message } => {
            assert_eq!(code, "sole_owner");
            assert!(message.contains(&campaign.slug));
        }
        other => panic!("expected conflict, got {:?}", other),
    }

    members::set_member(
        fixtures::actor(&owner),
        campaign.id,
        SetMemberInput {
            user_id: root.id,
            role: MemberRole::Owner,
        },
        &ctx.deps,
    )
    .await
    .unwrap();

    admin_users::delete_admin_user(fixtures::actor(&root), owner.id, &ctx.deps)
        .await
        .unwrap();
    let gone = AdminUser::find_by_id(owner.id, &ctx.db_pool).await.unwrap();
    assert!(gone.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn discarded_drafts_free_their_version_number(ctx: &TestHarness) {
    let admin = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let actor = fixtures::actor(&admin);
    let campaign = fixtures::create_campaign(&ctx.deps, &admin, |_| {}).await;

    let draft_input = |title: &str| {
        let mut settings = campaign.settings();
        settings.title = title.to_string();
        SaveDraftInput {
            settings,
            change_summary: None,
            publish: false,
        }
    };

    let draft = versions::save_draft(actor, campaign.id, draft_input("Scrapped"), &ctx.deps)
        .await
        .unwrap();
    assert_eq!(draft.version_number, 2);

    versions::discard_draft(actor, campaign.id, &ctx.deps).await.unwrap();

    let err = versions::get_draft(actor, campaign.id, &ctx.deps).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("Draft")));
    let err = versions::discard_draft(actor, campaign.id, &ctx.deps).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("Draft")));

    let live = campaigns::get_campaign(actor, campaign.id, &ctx.deps).await.unwrap();
    assert_eq!(live.campaign.title, "Cognitive Kin Stickers");
    assert!(!live.has_draft);

    // Numbering continues from the highest surviving version
    let next = versions::save_draft(actor, campaign.id, draft_input("Kept"), &ctx.deps)
        .await
        .unwrap();
    assert_eq!(next.version_number, 2);
    assert_eq!(next.status, VersionStatus::Draft);

    versions::publish_draft(actor, campaign.id, &ctx.deps).await.unwrap();
    let after_publish = versions::save_draft(actor, campaign.id, draft_input("Third"), &ctx.deps)
        .await
        .unwrap();
    assert_eq!(after_publish.version_number, 3);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn profile_fields_can_be_set_and_cleared(ctx: &TestHarness) {
    let admin = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let actor = fixtures::actor(&admin);

    let updated = admin_users::update_me(
        actor,
        UpdateProfile {
            phone: Some("+1 503 555 0100".into()),
            bio: Some("Sends kin everywhere".into()),
            website: Some("https://kin.test".into()),
            ..Default::default()
        },
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(updated.phone.as_deref(), Some("+1 503 555 0100"));
    assert_eq!(updated.website.as_deref(), Some("https://kin.test"));

    // Empty strings clear, absent fields stay
    let cleared = admin_users::update_me(
        actor,
        UpdateProfile {
            phone: Some(String::new()),
            website: Some("   ".into()),
            ..Default::default()
        },
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(cleared.phone, None);
    assert_eq!(cleared.website, None);
    assert_eq!(cleared.bio.as_deref(), Some("Sends kin everywhere"));
    assert_eq!(cleared.display_name, admin.display_name);
}
