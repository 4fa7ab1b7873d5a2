use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::utils::{clean, normalize_code, random_code};
use crate::common::{
    Actor, AppError, AppResult, AuthError, CampaignCapability, CampaignId, GiftCodeId,
};
use crate::domains::admin_users::AdminUser;
use crate::domains::campaigns::actions::{current_availability, find_campaign};
use crate::domains::campaigns::public::{is_publicly_visible, PublicCampaign};
use crate::domains::claims::actions::submit::{admit, Admission, SubmitClaimInput, SubmittedClaim};
use crate::domains::gifting::disclosure::{gifter_card, GifterCard};
use crate::domains::gifting::models::{AdminGiftCode, DisclosureInput};
use crate::domains::questions::CampaignQuestion;
use crate::kernel::ServerDeps;

const GIFT_PREFIX: &str = "GIFT";
const GENERATE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGiftCodeInput {
    pub campaign_id: CampaignId,
    /// Generated when omitted
    pub code: Option<String>,
    pub label: Option<String>,
    pub message: Option<String>,
    #[serde(flatten)]
    pub disclosure: DisclosureInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGiftCodeInput {
    pub label: Option<String>,
    pub message: Option<String>,
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub disclosure: DisclosureInput,
}

/// A gift code plus the link its QR code points at
#[derive(Debug, Clone, Serialize)]
pub struct GiftCodeWithLink {
    #[serde(flatten)]
    pub gift: AdminGiftCode,
    pub link: String,
}

impl GiftCodeWithLink {
    fn new(gift: AdminGiftCode, deps: &ServerDeps) -> Self {
        let link = deps.gift_link(&gift.code);
        Self { gift, link }
    }
}

/// What a recipient sees when opening a gift link
#[derive(Debug, Clone, Serialize)]
pub struct GiftView {
    pub code: String,
    pub message: Option<String>,
    pub campaign: PublicCampaign,
    pub gifter: GifterCard,
}

pub async fn create_gift_code(
    actor: Actor,
    input: CreateGiftCodeInput,
    deps: &ServerDeps,
) -> AppResult<GiftCodeWithLink> {
    actor
        .on(input.campaign_id)
        .can(CampaignCapability::ManageGiftCodes)
        .check(&deps.db_pool)
        .await?;

    let label = clean(input.label);
    let message = clean(input.message);

    let explicit = input
        .code
        .as_deref()
        .map(normalize_code)
        .filter(|c| !c.is_empty());

    let gift = match explicit {
        Some(code) => AdminGiftCode::create(
            actor.user_id,
            input.campaign_id,
            &code,
            label.as_deref(),
            message.as_deref(),
            input.disclosure,
            &deps.db_pool,
        )
        .await?
        .ok_or_else(|| AppError::conflict("code_taken", "That gift code is already in use"))?,
        None => {
            let mut created = None;
            for _ in 0..GENERATE_ATTEMPTS {
                created = AdminGiftCode::create(
                    actor.user_id,
                    input.campaign_id,
                    &random_code(Some(GIFT_PREFIX)),
                    label.as_deref(),
                    message.as_deref(),
                    input.disclosure,
                    &deps.db_pool,
                )
                .await?;
                if created.is_some() {
                    break;
                }
            }
            created.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("could not generate a unique gift code"))
            })?
        }
    };

    info!(
        gift_code_id = %gift.id,
        campaign_id = %gift.campaign_id,
        admin_user_id = %actor.user_id,
        "Gift code created"
    );
    Ok(GiftCodeWithLink::new(gift, deps))
}

/// Own codes; super admins see everyone's
pub async fn list_gift_codes(
    actor: Actor,
    deps: &ServerDeps,
) -> AppResult<Vec<GiftCodeWithLink>> {
    let gifts =
        AdminGiftCode::find_for_admin(actor.user_id, actor.is_super_admin(), &deps.db_pool).await?;
    Ok(gifts
        .into_iter()
        .map(|gift| GiftCodeWithLink::new(gift, deps))
        .collect())
}

pub async fn update_gift_code(
    actor: Actor,
    gift_code_id: GiftCodeId,
    input: UpdateGiftCodeInput,
    deps: &ServerDeps,
) -> AppResult<GiftCodeWithLink> {
    find_owned(actor, gift_code_id, deps).await?;

    let gift = AdminGiftCode::update(
        gift_code_id,
        input.label.as_deref().map(str::trim),
        input.message.as_deref().map(str::trim),
        input.is_active,
        input.disclosure,
        &deps.db_pool,
    )
    .await?
    .ok_or(AppError::NotFound("Gift code"))?;

    info!(gift_code_id = %gift.id, is_active = gift.is_active, "Gift code updated");
    Ok(GiftCodeWithLink::new(gift, deps))
}

pub async fn delete_gift_code(
    actor: Actor,
    gift_code_id: GiftCodeId,
    deps: &ServerDeps,
) -> AppResult<()> {
    find_owned(actor, gift_code_id, deps).await?;

    if !AdminGiftCode::delete(gift_code_id, &deps.db_pool).await? {
        return Err(AppError::NotFound("Gift code"));
    }

    info!(gift_code_id = %gift_code_id, deleted_by = %actor.user_id, "Gift code deleted");
    Ok(())
}

/// Public gift page: campaign, availability and the gifter's disclosed profile
pub async fn resolve_gift_code(code: &str, deps: &ServerDeps) -> AppResult<GiftView> {
    let gift = find_active(code, deps).await?;
    let campaign = find_campaign(gift.campaign_id, &deps.db_pool).await?;
    if !is_publicly_visible(&campaign) {
        return Err(AppError::NotFound("Gift code"));
    }

    let gifter = AdminUser::find_by_id(gift.admin_user_id, &deps.db_pool)
        .await?
        .ok_or(AppError::NotFound("Gift code"))?;

    let availability = current_availability(&campaign, &deps.db_pool).await?;
    let questions = CampaignQuestion::find_for_campaign(campaign.id, &deps.db_pool).await?;

    Ok(GiftView {
        gifter: gifter_card(&gifter, &gift),
        code: gift.code,
        message: gift.message,
        campaign: PublicCampaign::new(campaign, availability, questions),
    })
}

/// Submit through a gift link; the gift code stands in for an invite code.
pub async fn submit_gift_claim(
    code: &str,
    input: SubmitClaimInput,
    deps: &ServerDeps,
) -> AppResult<SubmittedClaim> {
    let gift = find_active(code, deps).await?;
    let campaign = find_campaign(gift.campaign_id, &deps.db_pool).await?;
    if !is_publicly_visible(&campaign) {
        return Err(AppError::NotFound("Gift code"));
    }

    admit(
        campaign,
        input.contact,
        input.answers,
        Admission::Gift(gift),
        deps,
    )
    .await
}

async fn find_active(code: &str, deps: &ServerDeps) -> AppResult<AdminGiftCode> {
    AdminGiftCode::find_active_by_code(&normalize_code(code), &deps.db_pool)
        .await?
        .ok_or(AppError::NotFound("Gift code"))
}

/// Gift codes belong to the admin who made them
async fn find_owned(
    actor: Actor,
    gift_code_id: GiftCodeId,
    deps: &ServerDeps,
) -> AppResult<AdminGiftCode> {
    let gift = AdminGiftCode::find_by_id(gift_code_id, &deps.db_pool)
        .await?
        .ok_or(AppError::NotFound("Gift code"))?;
    ensure_owner(actor, &gift)?;
    Ok(gift)
}

fn ensure_owner(actor: Actor, gift: &AdminGiftCode) -> Result<(), AuthError> {
    if actor.is_super_admin() || gift.admin_user_id == actor.user_id {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied(
            "Only the admin who created a gift code can change it".into(),
        ))
    }
}
