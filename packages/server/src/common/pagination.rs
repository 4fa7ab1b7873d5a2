//! Cursor-based pagination for admin list endpoints.
//!
//! Lists are ordered newest first by id. Ids are UUIDv7, so the id alone is a
//! stable sort key and the cursor is just the last id seen, base64 encoded.

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 25;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Opaque cursor for pagination (base64-encoded UUID).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(Uuid);

impl Cursor {
    pub fn new(id: Uuid) -> Self {
        Cursor(id)
    }

    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0.as_bytes())
    }

    pub fn encode_uuid(id: Uuid) -> String {
        Cursor::new(id).encode()
    }

    pub fn decode(s: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .context("Invalid cursor: not valid base64")?;
        let uuid = Uuid::from_slice(&bytes).context("Invalid cursor: not a valid UUID")?;
        Ok(Cursor(uuid))
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

/// Query-string arguments (`?first=50&after=...`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationArgs {
    pub first: Option<i64>,
    pub after: Option<String>,
}

impl PaginationArgs {
    pub fn validate(&self) -> Result<ValidatedPaginationArgs, &'static str> {
        let limit = self.first.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let cursor = self
            .after
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(Cursor::decode)
            .transpose()
            .map_err(|_| "Invalid cursor")?
            .map(Cursor::into_uuid);

        Ok(ValidatedPaginationArgs { limit, cursor })
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedPaginationArgs {
    /// Number of items to return (1-100, default 25)
    pub limit: i64,
    /// Return items strictly older than this id
    pub cursor: Option<Uuid>,
}

impl ValidatedPaginationArgs {
    /// One extra row tells us whether another page exists.
    pub fn fetch_limit(&self) -> i64 {
        self.limit + 1
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
    pub total_count: i64,
}

impl<T> Page<T> {
    /// Trim the over-fetched row and build page info.
    pub fn from_fetch(
        mut rows: Vec<T>,
        args: &ValidatedPaginationArgs,
        total_count: i64,
        id_of: impl Fn(&T) -> Uuid,
    ) -> Self {
        let has_next_page = rows.len() as i64 > args.limit;
        rows.truncate(args.limit as usize);
        let end_cursor = rows.last().map(|row| Cursor::encode_uuid(id_of(row)));

        Page {
            items: rows,
            page_info: PageInfo {
                has_next_page,
                end_cursor,
            },
            total_count,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_info: self.page_info,
            total_count: self.total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_round_trip() {
        let id = Uuid::now_v7();
        let encoded = Cursor::encode_uuid(id);
        assert_eq!(Cursor::decode(&encoded).unwrap().into_uuid(), id);
    }

    #[test]
    fn bad_cursor_is_rejected() {
        let args = PaginationArgs {
            first: None,
            after: Some("!!!".to_string()),
        };
        assert_eq!(args.validate().unwrap_err(), "Invalid cursor");
    }

    #[test]
    fn limit_is_clamped() {
        let args = PaginationArgs {
            first: Some(10_000),
            after: None,
        };
        assert_eq!(args.validate().unwrap().limit, MAX_PAGE_SIZE);

        let args = PaginationArgs {
            first: Some(0),
            after: None,
        };
        assert_eq!(args.validate().unwrap().limit, 1);

        assert_eq!(
            PaginationArgs::default().validate().unwrap().limit,
            DEFAULT_PAGE_SIZE
        );
    }

    #[test]
    fn empty_after_means_first_page() {
        let args = PaginationArgs {
            first: None,
            after: Some(String::new()),
        };
        assert!(args.validate().unwrap().cursor.is_none());
    }

    #[test]
    fn page_detects_extra_row() {
        let args = ValidatedPaginationArgs {
            limit: 2,
            cursor: None,
        };
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::now_v7()).collect();
        let page = Page::from_fetch(ids.clone(), &args, 10, |id| *id);

        assert!(page.page_info.has_next_page);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page_info.end_cursor, Some(Cursor::encode_uuid(ids[1])));
        assert_eq!(page.total_count, 10);
    }

    #[test]
    fn last_page_has_no_next() {
        let args = ValidatedPaginationArgs {
            limit: 5,
            cursor: None,
        };
        let page = Page::from_fetch(vec![Uuid::now_v7()], &args, 1, |id| *id);
        assert!(!page.page_info.has_next_page);
    }
}
