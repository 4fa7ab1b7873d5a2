use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::common::utils::{clean, normalize_code, random_code};
use crate::common::{
    Actor, AppError, AppResult, CampaignCapability, CampaignId, FieldError, InviteCodeId,
};
use crate::domains::invite_codes::models::InviteCode;
use crate::kernel::ServerDeps;

pub const MAX_GENERATED_CODES: u32 = 500;
const GENERATE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateInviteCodesInput {
    /// Explicit code; mutually exclusive with `count`
    pub code: Option<String>,
    pub count: Option<u32>,
    pub prefix: Option<String>,
    pub max_uses: Option<i32>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateInviteCodeInput {
    pub is_active: Option<bool>,
    pub max_uses: Option<i32>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InviteCodeRemoval {
    Deleted,
    /// The code was used, so it is kept for the record and switched off
    Deactivated { invite_code: InviteCode },
}

pub async fn create_invite_codes(
    actor: Actor,
    campaign_id: CampaignId,
    input: CreateInviteCodesInput,
    deps: &ServerDeps,
) -> AppResult<Vec<InviteCode>> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::ManageInviteCodes)
        .check(&deps.db_pool)
        .await?;

    let request = parse_request(&input)?;
    let note = clean(input.note);

    let codes = match request {
        CodeRequest::Explicit(code) => {
            let invite = InviteCode::create(
                campaign_id,
                &code,
                input.max_uses,
                note.as_deref(),
                actor.user_id,
                &deps.db_pool,
            )
            .await?
            .ok_or_else(|| {
                AppError::conflict("code_taken", format!("Code {} already exists", code))
            })?;
            vec![invite]
        }
        CodeRequest::Generate { count, prefix } => {
            let mut tx = deps.db_pool.begin().await?;
            let mut created = Vec::with_capacity(count as usize);

            for _ in 0..count {
                let mut attempts = 0;
                let invite = loop {
                    attempts += 1;
                    let code = random_code(prefix.as_deref());
                    if let Some(invite) = InviteCode::create(
                        campaign_id,
                        &code,
                        input.max_uses,
                        note.as_deref(),
                        actor.user_id,
                        &mut *tx,
                    )
                    .await?
                    {
                        break invite;
                    }
                    warn!(campaign_id = %campaign_id, "Generated invite code collided, retrying");
                    if attempts >= GENERATE_ATTEMPTS {
                        return Err(AppError::Internal(anyhow::anyhow!(
                            "could not generate a unique invite code"
                        )));
                    }
                };
                created.push(invite);
            }

            tx.commit().await?;
            created
        }
    };

    info!(campaign_id = %campaign_id, count = codes.len(), "Invite codes created");
    Ok(codes)
}

pub async fn list_invite_codes(
    actor: Actor,
    campaign_id: CampaignId,
    deps: &ServerDeps,
) -> AppResult<Vec<InviteCode>> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::View)
        .check(&deps.db_pool)
        .await?;

    Ok(InviteCode::find_for_campaign(campaign_id, &deps.db_pool).await?)
}

pub async fn update_invite_code(
    actor: Actor,
    campaign_id: CampaignId,
    invite_code_id: InviteCodeId,
    input: UpdateInviteCodeInput,
    deps: &ServerDeps,
) -> AppResult<InviteCode> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::ManageInviteCodes)
        .check(&deps.db_pool)
        .await?;

    check_max_uses(input.max_uses).map_err(|e| AppError::Validation(vec![e]))?;
    let note = clean(input.note);

    InviteCode::update(
        invite_code_id,
        campaign_id,
        input.is_active,
        input.max_uses,
        note.as_deref(),
        &deps.db_pool,
    )
    .await?
    .ok_or(AppError::NotFound("Invite code"))
}

/// Delete an unused code, or deactivate one that has been redeemed
pub async fn remove_invite_code(
    actor: Actor,
    campaign_id: CampaignId,
    invite_code_id: InviteCodeId,
    deps: &ServerDeps,
) -> AppResult<InviteCodeRemoval> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::ManageInviteCodes)
        .check(&deps.db_pool)
        .await?;

    InviteCode::find_in_campaign(invite_code_id, campaign_id, &deps.db_pool)
        .await?
        .ok_or(AppError::NotFound("Invite code"))?;

    if InviteCode::delete_unused(invite_code_id, &deps.db_pool).await? {
        info!(invite_code_id = %invite_code_id, "Invite code deleted");
        return Ok(InviteCodeRemoval::Deleted);
    }

    let invite_code = InviteCode::update(
        invite_code_id,
        campaign_id,
        Some(false),
        None,
        None,
        &deps.db_pool,
    )
    .await?
    .ok_or(AppError::NotFound("Invite code"))?;

    info!(invite_code_id = %invite_code_id, uses = invite_code.uses, "Invite code deactivated");
    Ok(InviteCodeRemoval::Deactivated { invite_code })
}

#[derive(Debug, PartialEq, Eq)]
enum CodeRequest {
    Explicit(String),
    Generate { count: u32, prefix: Option<String> },
}

fn parse_request(input: &CreateInviteCodesInput) -> AppResult<CodeRequest> {
    check_max_uses(input.max_uses).map_err(|e| AppError::Validation(vec![e]))?;

    match (input.code.as_deref(), input.count) {
        (Some(code), None) => {
            let code = normalize_code(code);
            check_code(&code).map_err(|e| AppError::Validation(vec![e]))?;
            Ok(CodeRequest::Explicit(code))
        }
        (None, Some(count)) => {
            if count == 0 || count > MAX_GENERATED_CODES {
                return Err(AppError::invalid(
                    "count",
                    format!("must be between 1 and {}", MAX_GENERATED_CODES),
                ));
            }
            let prefix = input
                .prefix
                .as_deref()
                .map(normalize_code)
                .filter(|p| !p.is_empty());
            if let Some(p) = &prefix {
                check_code(p).map_err(|_| {
                    AppError::invalid("prefix", "may only contain letters, digits and dashes")
                })?;
            }
            Ok(CodeRequest::Generate { count, prefix })
        }
        _ => Err(AppError::BadRequest(
            "Provide either code or count".to_string(),
        )),
    }
}

fn check_code(code: &str) -> Result<(), FieldError> {
    if code.len() < 3 || code.len() > 32 {
        return Err(FieldError::new("code", "must be 3 to 32 characters"));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(FieldError::new(
            "code",
            "may only contain letters, digits and dashes",
        ));
    }
    Ok(())
}

fn check_max_uses(max_uses: Option<i32>) -> Result<(), FieldError> {
    match max_uses {
        Some(n) if n < 1 => Err(FieldError::new("max_uses", "must be at least 1")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_codes_are_normalized() {
        let input = CreateInviteCodesInput {
            code: Some(" kin 2025 ".into()),
            ..Default::default()
        };
        assert_eq!(
            parse_request(&input).unwrap(),
            CodeRequest::Explicit("KIN2025".into())
        );
    }

    #[test]
    fn code_and_count_are_exclusive() {
        let both = CreateInviteCodesInput {
            code: Some("KIN".into()),
            count: Some(3),
            ..Default::default()
        };
        assert!(matches!(parse_request(&both), Err(AppError::BadRequest(_))));
        assert!(matches!(
            parse_request(&CreateInviteCodesInput::default()),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn generated_batch_size_is_bounded() {
        let input = CreateInviteCodesInput {
            count: Some(501),
            ..Default::default()
        };
        assert!(matches!(parse_request(&input), Err(AppError::Validation(_))));
    }

    #[test]
    fn prefix_is_normalized() {
        let input = CreateInviteCodesInput {
            count: Some(2),
            prefix: Some("vip".into()),
            ..Default::default()
        };
        assert_eq!(
            parse_request(&input).unwrap(),
            CodeRequest::Generate {
                count: 2,
                prefix: Some("VIP".into())
            }
        );
    }

    #[test]
    fn bad_codes_are_rejected() {
        assert!(check_code("AB").is_err());
        assert!(check_code("KIN_2025").is_err());
        assert!(check_code("KIN-2025").is_ok());
    }

    #[test]
    fn max_uses_must_be_positive() {
        assert!(check_max_uses(Some(0)).is_err());
        assert!(check_max_uses(Some(1)).is_ok());
        assert!(check_max_uses(None).is_ok());
    }
}
