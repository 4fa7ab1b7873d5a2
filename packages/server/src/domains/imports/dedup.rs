//! Duplicate detection for imports.
//!
//! A row is a duplicate when its email or address fingerprint matches a
//! claim in any campaign, or a row earlier in the same file.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domains::claims::models::ExistingClaimMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateReason {
    Email,
    Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Duplicate {
    pub row: usize,
    pub reason: DuplicateReason,
    /// Slug of the campaign holding the matching claim; `None` when the match
    /// is an earlier row of the same file
    pub matched_campaign: Option<String>,
}

/// Existing claims keyed by email and fingerprint, plus what this file has
/// already used
#[derive(Debug, Default)]
pub struct DedupIndex {
    emails: HashMap<String, String>,
    fingerprints: HashMap<String, String>,
    seen_emails: HashSet<String>,
    seen_fingerprints: HashSet<String>,
}

impl DedupIndex {
    pub fn new(existing: Vec<ExistingClaimMatch>) -> Self {
        let mut index = Self::default();
        for m in existing {
            if let Some(email) = m.email {
                index
                    .emails
                    .entry(email.to_lowercase())
                    .or_insert_with(|| m.campaign_slug.clone());
            }
            if let Some(fingerprint) = m.fingerprint {
                index
                    .fingerprints
                    .entry(fingerprint)
                    .or_insert(m.campaign_slug);
            }
        }
        index
    }

    /// Check a row and, when it is new, remember its keys for later rows.
    pub fn check(
        &mut self,
        row: usize,
        email: Option<&str>,
        fingerprint: Option<&str>,
    ) -> Option<Duplicate> {
        let email = email.map(str::to_lowercase);

        let duplicate = |reason, matched_campaign| Duplicate {
            row,
            reason,
            matched_campaign,
        };

        if let Some(email) = &email {
            if let Some(slug) = self.emails.get(email) {
                return Some(duplicate(DuplicateReason::Email, Some(slug.clone())));
            }
        }
        if let Some(fingerprint) = fingerprint {
            if let Some(slug) = self.fingerprints.get(fingerprint) {
                return Some(duplicate(DuplicateReason::Address, Some(slug.clone())));
            }
        }
        if matches!(&email, Some(e) if self.seen_emails.contains(e)) {
            return Some(duplicate(DuplicateReason::Email, None));
        }
        if matches!(fingerprint, Some(f) if self.seen_fingerprints.contains(f)) {
            return Some(duplicate(DuplicateReason::Address, None));
        }

        if let Some(email) = email {
            self.seen_emails.insert(email);
        }
        if let Some(fingerprint) = fingerprint {
            self.seen_fingerprints.insert(fingerprint.to_string());
        }
        None
    }
}
