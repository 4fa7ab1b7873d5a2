use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::common::{ClaimAnswerId, ClaimId, QuestionId};

/// Answer payload: free text / a single choice, or a set of checkbox choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Choices(Vec<String>),
}

impl AnswerValue {
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Choices(c) => c.iter().all(|s| s.trim().is_empty()),
        }
    }

    /// Flat text for CSV cells; checkbox choices joined with `; `
    pub fn to_cell(&self) -> String {
        match self {
            AnswerValue::Text(s) => s.clone(),
            AnswerValue::Choices(c) => c.join("; "),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClaimAnswer {
    pub id: ClaimAnswerId,
    pub claim_id: ClaimId,
    pub question_id: QuestionId,
    pub value: Json<AnswerValue>,
    pub created_at: DateTime<Utc>,
}

impl ClaimAnswer {
    /// Insert (or overwrite) a claim's answers
    pub async fn save_all(
        claim_id: ClaimId,
        answers: &[(QuestionId, AnswerValue)],
        conn: &mut PgConnection,
    ) -> Result<()> {
        for (question_id, value) in answers {
            sqlx::query(
                r#"
                INSERT INTO claim_answers (id, claim_id, question_id, value)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (claim_id, question_id) DO UPDATE SET value = EXCLUDED.value
                "#,
            )
            .bind(ClaimAnswerId::new())
            .bind(claim_id)
            .bind(*question_id)
            .bind(Json(value))
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn find_for_claim(claim_id: ClaimId, pool: &PgPool) -> Result<Vec<Self>> {
        let answers = sqlx::query_as::<_, Self>(
            "SELECT * FROM claim_answers WHERE claim_id = $1 ORDER BY created_at",
        )
        .bind(claim_id)
        .fetch_all(pool)
        .await?;
        Ok(answers)
    }

    pub async fn find_for_claims(claim_ids: &[ClaimId], pool: &PgPool) -> Result<Vec<Self>> {
        let answers =
            sqlx::query_as::<_, Self>("SELECT * FROM claim_answers WHERE claim_id = ANY($1)")
                .bind(claim_ids)
                .fetch_all(pool)
                .await?;
        Ok(answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_values_parse_from_json() {
        let text: AnswerValue = serde_json::from_str(r#""Blue""#).unwrap();
        assert_eq!(text, AnswerValue::Text("Blue".into()));

        let choices: AnswerValue = serde_json::from_str(r#"["Red","Green"]"#).unwrap();
        assert_eq!(choices.to_cell(), "Red; Green");
    }

    #[test]
    fn blank_answers() {
        assert!(AnswerValue::Text("  ".into()).is_blank());
        assert!(AnswerValue::Choices(vec![]).is_blank());
        assert!(!AnswerValue::Choices(vec!["a".into()]).is_blank());
    }
}
