use std::collections::HashSet;

use super::models::QuestionType;
use crate::common::{FieldError, QuestionId};

/// Choice questions need at least one distinct, non-blank option. Text
/// questions never carry options.
pub fn normalize_options(
    question_type: QuestionType,
    options: Vec<String>,
) -> Result<Vec<String>, FieldError> {
    if !question_type.has_options() {
        return Ok(Vec::new());
    }

    let mut seen = HashSet::new();
    let cleaned: Vec<String> = options
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .filter(|o| seen.insert(o.clone()))
        .collect();

    if cleaned.is_empty() {
        return Err(FieldError::new(
            "options",
            "choice questions need at least one option",
        ));
    }
    Ok(cleaned)
}

/// A reorder request must name every question of the campaign exactly once.
pub fn check_reorder(existing: &[QuestionId], requested: &[QuestionId]) -> Result<(), String> {
    let wanted: HashSet<_> = requested.iter().collect();
    if wanted.len() != requested.len() {
        return Err("question ids must not repeat".to_string());
    }

    let current: HashSet<_> = existing.iter().collect();
    if wanted != current {
        return Err("question ids must match the campaign's questions exactly".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_questions_drop_options() {
        let options = normalize_options(QuestionType::Text, vec!["a".into()]).unwrap();
        assert!(options.is_empty());
    }

    #[test]
    fn choice_options_are_trimmed_and_deduplicated() {
        let options = normalize_options(
            QuestionType::MultipleChoice,
            vec![" Small ".into(), "Small".into(), "".into(), "Large".into()],
        )
        .unwrap();
        assert_eq!(options, vec!["Small", "Large"]);
    }

    #[test]
    fn choice_question_without_options_is_rejected() {
        let err = normalize_options(QuestionType::Checkboxes, vec!["  ".into()]).unwrap_err();
        assert_eq!(err.field, "options");
    }

    #[test]
    fn reorder_must_cover_every_question() {
        let a = QuestionId::new();
        let b = QuestionId::new();
        let c = QuestionId::new();

        assert!(check_reorder(&[a, b], &[b, a]).is_ok());
        assert!(check_reorder(&[a, b], &[a]).is_err());
        assert!(check_reorder(&[a, b], &[a, b, c]).is_err());
        assert!(check_reorder(&[a, b], &[a, a]).is_err());
    }
}
