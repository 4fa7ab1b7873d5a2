//! CSV rendering for claim exports.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use csv::Writer;

use crate::common::{ClaimId, QuestionId};
use crate::domains::claims::models::{Claim, ClaimAnswer};
use crate::domains::questions::CampaignQuestion;

const FIXED_COLUMNS: &[&str] = &[
    "id",
    "status",
    "name",
    "email",
    "phone",
    "address_line1",
    "address_line2",
    "city",
    "region",
    "postal_code",
    "country",
    "source",
    "is_test",
    "submitted_at",
    "shipped_at",
    "carrier",
    "tracking_number",
    "admin_notes",
];

/// Leading characters a spreadsheet reads as the start of a formula.
const FORMULA_TRIGGERS: &[char] = &['=', '+', '-', '@', '\t', '\r'];

/// Quote a cell so spreadsheets show it as text instead of evaluating it.
fn neutralize(cell: String) -> String {
    if cell.starts_with(FORMULA_TRIGGERS) {
        format!("'{}", cell)
    } else {
        cell
    }
}

/// `{slug}-claims-{date}.csv`
pub fn export_filename(slug: &str, date: NaiveDate) -> String {
    format!("{}-claims-{}.csv", slug, date.format("%Y-%m-%d"))
}

/// One row per claim, then one column per question in display order.
pub fn render_claims(
    questions: &[CampaignQuestion],
    claims: &[Claim],
    answers: Vec<ClaimAnswer>,
) -> Result<String> {
    let mut by_claim: HashMap<(ClaimId, QuestionId), String> = HashMap::new();
    for answer in answers {
        by_claim.insert((answer.claim_id, answer.question_id), answer.value.to_cell());
    }

    let mut writer = Writer::from_writer(Vec::new());

    let header = FIXED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(questions.iter().map(|q| neutralize(q.prompt.clone())));
    writer.write_record(header)?;

    for claim in claims {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let time = |value: Option<DateTime<Utc>>| {
            value
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default()
        };

        let mut record = vec![
            claim.id.to_string(),
            claim.status.to_string(),
            text(&claim.name),
            text(&claim.email),
            text(&claim.phone),
            text(&claim.address_line1),
            text(&claim.address_line2),
            text(&claim.city),
            text(&claim.region),
            text(&claim.postal_code),
            text(&claim.country),
            claim.source.to_string(),
            claim.is_test_claim.to_string(),
            time(claim.submitted_at),
            time(claim.shipped_at),
            text(&claim.carrier),
            text(&claim.tracking_number),
            text(&claim.admin_notes),
        ];
        record.extend(questions.iter().map(|q| {
            by_claim
                .get(&(claim.id, q.id))
                .cloned()
                .unwrap_or_default()
        }));
        writer.write_record(record.into_iter().map(neutralize))?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV")?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sqlx::types::Json;

    use super::*;
    use crate::common::{CampaignId, ClaimAnswerId};
    use crate::domains::claims::models::claim::test_claim;
    use crate::domains::claims::models::AnswerValue;
    use crate::domains::questions::QuestionType;

    fn question(campaign_id: CampaignId, prompt: &str, order: i32) -> CampaignQuestion {
        let now = Utc::now();
        CampaignQuestion {
            id: QuestionId::new(),
            campaign_id,
            prompt: prompt.to_string(),
            question_type: QuestionType::Checkboxes,
            options: Json(vec!["Red".into(), "Blue".into()]),
            is_required: false,
            display_order: order,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn filename_uses_slug_and_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(export_filename("spring-kin", date), "spring-kin-claims-2026-03-09.csv");
    }

    #[test]
    fn renders_fixed_and_question_columns() {
        let campaign_id = CampaignId::new();
        let colours = question(campaign_id, "Favourite colours", 0);
        let pets = question(campaign_id, "Pets, if any", 1);

        let mut claim = test_claim(campaign_id);
        claim.submitted_at = Some(Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap());
        let answers = vec![ClaimAnswer {
            id: ClaimAnswerId::new(),
            claim_id: claim.id,
            question_id: colours.id,
            value: Json(AnswerValue::Choices(vec!["Red".into(), "Blue".into()])),
            created_at: Utc::now(),
        }];

        let csv = render_claims(&[colours, pets], &[claim.clone()], answers).unwrap();
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("id,status,name,email,"));
        assert!(header.ends_with("admin_notes,Favourite colours,\"Pets, if any\""));

        let row = lines.next().unwrap();
        assert!(row.starts_with(&format!("{},confirmed,Ada Lovelace,", claim.id)));
        assert!(row.contains(",form,false,2026-03-09T12:00:00Z,,"));
        assert!(row.ends_with(",Red; Blue,"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn formula_cells_are_quoted_as_text() {
        let campaign_id = CampaignId::new();
        let mut claim = test_claim(campaign_id);
        claim.name = Some("=HYPERLINK(\"http://evil\",\"x\")".into());
        claim.admin_notes = Some("@SUM(A1)".into());
        claim.city = Some("-Portland".into());

        let csv = render_claims(&[], &[claim], vec![]).unwrap();
        let row = csv.lines().nth(1).unwrap();

        assert!(row.contains(",\"'=HYPERLINK(\"\"http://evil\"\",\"\"x\"\")\","));
        assert!(row.contains(",'-Portland,"));
        assert!(row.ends_with(",'@SUM(A1)"));
    }

    #[test]
    fn only_formula_prefixes_are_quoted() {
        assert_eq!(neutralize("Ada Lovelace".into()), "Ada Lovelace");
        assert_eq!(neutralize(String::new()), "");
        assert_eq!(neutralize("+15035550100".into()), "'+15035550100");
    }
}
