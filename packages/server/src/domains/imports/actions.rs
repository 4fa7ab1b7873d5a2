use serde::Serialize;
use tracing::info;

use crate::common::{Actor, AppError, AppResult, CampaignCapability, CampaignId};
use crate::domains::campaigns::actions::find_campaign;
use crate::domains::claims::models::{Claim, ClaimSource, NewClaim};
use crate::domains::imports::columns::ColumnMapping;
use crate::domains::imports::dedup::{DedupIndex, Duplicate};
use crate::domains::imports::parser::{parse_sheet, ImportRow, RowError};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Serialize)]
pub struct DetectedColumn {
    pub field: &'static str,
    pub header: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub dry_run: bool,
    pub rows: usize,
    pub imported: usize,
    pub duplicates: Vec<Duplicate>,
    pub errors: Vec<RowError>,
    pub columns: Vec<DetectedColumn>,
}

/// Import claims from CSV text. With `dry_run` the report is produced the
/// same way but nothing is written.
pub async fn import_claims(
    actor: Actor,
    campaign_id: CampaignId,
    csv_text: &str,
    dry_run: bool,
    deps: &ServerDeps,
) -> AppResult<ImportReport> {
    actor
        .on(campaign_id)
        .can(CampaignCapability::ImportClaims)
        .check(&deps.db_pool)
        .await?;

    let campaign = find_campaign(campaign_id, &deps.db_pool).await?;

    let sheet = parse_sheet(csv_text).map_err(|e| AppError::BadRequest(format!("{:#}", e)))?;

    let missing = sheet.mapping.missing();
    if !missing.is_empty() {
        return Err(AppError::rejected(
            "missing_columns",
            format!(
                "Missing required columns: {}. Found headers: {}",
                missing.join(", "),
                sheet.headers.join(", ")
            ),
        ));
    }

    let keyed: Vec<(ImportRow, Option<String>)> = sheet
        .rows
        .into_iter()
        .map(|row| {
            let fingerprint = row.contact.fingerprint();
            (row, fingerprint)
        })
        .collect();

    let emails: Vec<String> = keyed
        .iter()
        .filter_map(|(row, _)| row.contact.normalized_email())
        .collect();
    let fingerprints: Vec<String> = keyed.iter().filter_map(|(_, fp)| fp.clone()).collect();
    let existing = Claim::find_matches(&emails, &fingerprints, &deps.db_pool).await?;

    let mut index = DedupIndex::new(existing);
    let mut duplicates = Vec::new();
    let mut accepted = Vec::new();
    for (row, fingerprint) in keyed {
        let email = row.contact.normalized_email();
        match index.check(row.row, email.as_deref(), fingerprint.as_deref()) {
            Some(duplicate) => duplicates.push(duplicate),
            None => accepted.push((row, fingerprint)),
        }
    }

    if !dry_run && !accepted.is_empty() {
        let mut tx = deps.db_pool.begin().await?;
        for (row, fingerprint) in &accepted {
            let mut new_claim =
                NewClaim::submitted(campaign.id, row.contact.clone(), ClaimSource::Import);
            new_claim.status = row.status;
            new_claim.fingerprint = fingerprint.clone();
            new_claim.admin_notes = row.notes.clone();
            Claim::insert(&new_claim, &mut *tx).await?;
        }
        tx.commit().await?;
    }

    let report = ImportReport {
        dry_run,
        rows: sheet.total_rows,
        imported: accepted.len(),
        duplicates,
        errors: sheet.errors,
        columns: detected_columns(&sheet.mapping, &sheet.headers),
    };

    info!(
        campaign_id = %campaign.id,
        dry_run,
        rows = report.rows,
        imported = report.imported,
        duplicates = report.duplicates.len(),
        errors = report.errors.len(),
        "Claims imported"
    );
    Ok(report)
}

/// Which header feeds each field, in field order
pub fn detected_columns(mapping: &ColumnMapping, headers: &[String]) -> Vec<DetectedColumn> {
    [
        ("name", mapping.name),
        ("first_name", mapping.first_name),
        ("last_name", mapping.last_name),
        ("email", mapping.email),
        ("phone", mapping.phone),
        ("address_line1", mapping.address_line1),
        ("address_line2", mapping.address_line2),
        ("city", mapping.city),
        ("region", mapping.region),
        ("postal_code", mapping.postal_code),
        ("country", mapping.country),
        ("status", mapping.status),
        ("notes", mapping.notes),
    ]
    .into_iter()
    .filter_map(|(field, index)| {
        let header = headers.get(index?)?.clone();
        Some(DetectedColumn { field, header })
    })
    .collect()
}
