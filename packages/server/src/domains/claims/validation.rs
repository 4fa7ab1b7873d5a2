//! Field and answer rules for public claim forms.

use std::collections::HashMap;

use super::models::{AnswerValue, ClaimContact};
use crate::common::utils::{clean, is_valid_email, is_valid_phone};
use crate::common::{FieldError, QuestionId};
use crate::domains::campaigns::Campaign;
use crate::domains::questions::{CampaignQuestion, QuestionType};

pub const DEFAULT_COUNTRY: &str = "US";

/// Form requirements taken from the campaign
#[derive(Debug, Clone, Copy)]
pub struct FormRules {
    pub require_email: bool,
    pub require_phone: bool,
    pub allow_international: bool,
}

impl From<&Campaign> for FormRules {
    fn from(c: &Campaign) -> Self {
        Self {
            require_email: c.require_email,
            require_phone: c.require_phone,
            allow_international: c.allow_international,
        }
    }
}

/// Trim every field, default and upper-case the country, lower-case email.
pub fn normalize_contact(contact: ClaimContact) -> ClaimContact {
    ClaimContact {
        name: clean(contact.name),
        email: clean(contact.email).map(|e| e.to_lowercase()),
        phone: clean(contact.phone),
        address_line1: clean(contact.address_line1),
        address_line2: clean(contact.address_line2),
        city: clean(contact.city),
        region: clean(contact.region),
        postal_code: clean(contact.postal_code),
        country: Some(
            clean(contact.country)
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        ),
    }
}

pub fn validate_contact(
    contact: ClaimContact,
    rules: FormRules,
) -> Result<ClaimContact, Vec<FieldError>> {
    let contact = normalize_contact(contact);
    let mut errors = Vec::new();

    for (field, value) in [
        ("name", &contact.name),
        ("address_line1", &contact.address_line1),
        ("city", &contact.city),
        ("postal_code", &contact.postal_code),
    ] {
        if value.is_none() {
            errors.push(FieldError::new(field, "is required"));
        }
    }

    let country = contact.country.as_deref().unwrap_or(DEFAULT_COUNTRY);
    if country == DEFAULT_COUNTRY {
        if contact.region.is_none() {
            errors.push(FieldError::new("region", "is required for US addresses"));
        }
    } else if !rules.allow_international {
        errors.push(FieldError::new(
            "country",
            "this campaign only ships within the US",
        ));
    }

    match contact.email.as_deref() {
        None if rules.require_email => errors.push(FieldError::new("email", "is required")),
        Some(email) if !is_valid_email(email) => {
            errors.push(FieldError::new("email", "must be a valid email address"))
        }
        _ => {}
    }

    match contact.phone.as_deref() {
        None if rules.require_phone => errors.push(FieldError::new("phone", "is required")),
        Some(phone) if !is_valid_phone(phone) => {
            errors.push(FieldError::new("phone", "must be a valid phone number"))
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(contact)
    } else {
        Err(errors)
    }
}

/// Check answers against the campaign's questions and return the ones worth
/// storing (blank optional answers are dropped).
pub fn validate_answers(
    questions: &[CampaignQuestion],
    answers: HashMap<QuestionId, AnswerValue>,
) -> Result<Vec<(QuestionId, AnswerValue)>, Vec<FieldError>> {
    let mut errors = Vec::new();

    for id in answers.keys() {
        if !questions.iter().any(|q| q.id == *id) {
            errors.push(FieldError::new(
                format!("answers.{}", id),
                "unknown question",
            ));
        }
    }

    let mut accepted = Vec::new();
    for question in questions {
        let field = format!("answers.{}", question.id);
        let value = answers.get(&question.id).filter(|v| !v.is_blank());

        let Some(value) = value else {
            if question.is_required {
                errors.push(FieldError::new(field, "is required"));
            }
            continue;
        };

        match check_answer(question, value) {
            Ok(value) => accepted.push((question.id, value)),
            Err(message) => errors.push(FieldError::new(field, message)),
        }
    }

    if errors.is_empty() {
        Ok(accepted)
    } else {
        Err(errors)
    }
}

fn check_answer(question: &CampaignQuestion, value: &AnswerValue) -> Result<AnswerValue, String> {
    let options = &question.options.0;

    match (question.question_type, value) {
        (QuestionType::Text, AnswerValue::Text(text)) => Ok(AnswerValue::Text(text.trim().into())),
        (QuestionType::Text, AnswerValue::Choices(_)) => Err("must be text".into()),

        (QuestionType::MultipleChoice, AnswerValue::Text(choice)) => {
            let choice = choice.trim();
            if options.iter().any(|o| o == choice) {
                Ok(AnswerValue::Text(choice.to_string()))
            } else {
                Err(format!("'{}' is not one of the options", choice))
            }
        }
        (QuestionType::MultipleChoice, AnswerValue::Choices(_)) => {
            Err("pick exactly one option".into())
        }

        (QuestionType::Checkboxes, value) => {
            let picked: Vec<String> = match value {
                AnswerValue::Text(one) => vec![one.trim().to_string()],
                AnswerValue::Choices(many) => many.iter().map(|c| c.trim().to_string()).collect(),
            };

            let mut chosen: Vec<String> = Vec::new();
            for choice in picked.into_iter().filter(|c| !c.is_empty()) {
                if !options.contains(&choice) {
                    return Err(format!("'{}' is not one of the options", choice));
                }
                if !chosen.contains(&choice) {
                    chosen.push(choice);
                }
            }
            Ok(AnswerValue::Choices(chosen))
        }
    }
}
