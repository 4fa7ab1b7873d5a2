//! Turn CSV text into claim rows using a detected column mapping.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;

use super::columns::ColumnMapping;
use crate::common::utils::clean;
use crate::domains::claims::models::{ClaimContact, ClaimStatus};
use crate::domains::claims::validation::normalize_contact;

/// A row that made it through per-row validation
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    /// Spreadsheet row number; the header is row 1
    pub row: usize,
    pub contact: ClaimContact,
    pub status: ClaimStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub mapping: ColumnMapping,
    pub rows: Vec<ImportRow>,
    pub errors: Vec<RowError>,
    /// Data rows seen, valid or not
    pub total_rows: usize,
}

/// Read the header row and every data row. Blank lines are skipped.
pub fn parse_sheet(text: &str) -> Result<ParsedSheet> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(str::to_string)
        .collect();
    let mapping = ColumnMapping::detect(&headers);

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    let mut total_rows = 0;

    for (index, record) in reader.records().enumerate() {
        // Line numbers from the reader stay right when blank lines are skipped
        let fallback = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                total_rows += 1;
                errors.push(RowError {
                    row: e.position().map_or(fallback, |p| p.line() as usize),
                    message: format!("Unreadable row: {}", e),
                });
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        total_rows += 1;
        let row = record.position().map_or(fallback, |p| p.line() as usize);

        match read_row(&record, &mapping) {
            Ok((contact, status, notes)) => rows.push(ImportRow {
                row,
                contact,
                status,
                notes,
            }),
            Err(message) => errors.push(RowError { row, message }),
        }
    }

    Ok(ParsedSheet {
        headers,
        mapping,
        rows,
        errors,
        total_rows,
    })
}

fn read_row(
    record: &StringRecord,
    mapping: &ColumnMapping,
) -> Result<(ClaimContact, ClaimStatus, Option<String>), String> {
    let cell = |index: Option<usize>| clean(index.and_then(|i| record.get(i)).map(str::to_string));

    let name = cell(mapping.name).or_else(|| {
        let full = [cell(mapping.first_name), cell(mapping.last_name)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        clean(Some(full))
    });

    let contact = normalize_contact(ClaimContact {
        name,
        email: cell(mapping.email),
        phone: cell(mapping.phone),
        address_line1: cell(mapping.address_line1),
        address_line2: cell(mapping.address_line2),
        city: cell(mapping.city),
        region: cell(mapping.region),
        postal_code: cell(mapping.postal_code),
        country: cell(mapping.country),
    });

    if contact.name.is_none() {
        return Err("Missing name".to_string());
    }
    if contact.address_line1.is_none() {
        return Err("Missing address".to_string());
    }

    let status = match cell(mapping.status) {
        None => ClaimStatus::Confirmed,
        Some(raw) => raw
            .to_lowercase()
            .parse::<ClaimStatus>()
            .map_err(|_| format!("Unknown status '{}'", raw))?,
    };

    Ok((contact, status, cell(mapping.notes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_with_defaults() {
        let sheet = parse_sheet(
            "Name,Email,Address,City,State,Zip\n\
             Ada Lovelace,ADA@example.com,12 Engine St,London,OR,97201\n",
        )
        .unwrap();

        assert_eq!(sheet.total_rows, 1);
        assert!(sheet.errors.is_empty());
        let row = &sheet.rows[0];
        assert_eq!(row.row, 2);
        assert_eq!(row.status, ClaimStatus::Confirmed);
        assert_eq!(row.contact.email.as_deref(), Some("ada@example.com"));
        assert_eq!(row.contact.country.as_deref(), Some("US"));
    }

    #[test]
    fn first_and_last_names_combine() {
        let sheet = parse_sheet("First Name,Last Name,Address 1\nGrace,Hopper,1 Navy Way\n").unwrap();
        assert_eq!(sheet.rows[0].contact.name.as_deref(), Some("Grace Hopper"));
    }

    #[test]
    fn bad_rows_are_reported_by_row_number() {
        let sheet = parse_sheet(
            "Name,Address,Status\n\
             Ada,12 Engine St,pending\n\
             ,3 Loom Rd,\n\
             Grace,,\n\
             Linus,4 Kernel Ct,lost\n",
        )
        .unwrap();

        assert_eq!(sheet.total_rows, 4);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].status, ClaimStatus::Pending);
        assert_eq!(
            sheet.errors,
            vec![
                RowError { row: 3, message: "Missing name".into() },
                RowError { row: 4, message: "Missing address".into() },
                RowError { row: 5, message: "Unknown status 'lost'".into() },
            ]
        );
    }

    #[test]
    fn blank_lines_and_bom_are_ignored() {
        let sheet = parse_sheet("\u{feff}Name,Address\n\nAda,12 Engine St\n,\n").unwrap();
        assert_eq!(sheet.headers[0], "Name");
        assert_eq!(sheet.total_rows, 1);
        assert_eq!(sheet.rows.len(), 1);
    }

    #[test]
    fn row_numbers_count_skipped_blank_lines() {
        let sheet = parse_sheet(
            "Name,Address\n\
             Ada,12 Engine St\n\
             \n\
             \n\
             Grace,\n",
        )
        .unwrap();

        assert_eq!(sheet.rows[0].row, 2);
        assert_eq!(
            sheet.errors,
            vec![RowError { row: 5, message: "Missing address".into() }]
        );
    }
}
