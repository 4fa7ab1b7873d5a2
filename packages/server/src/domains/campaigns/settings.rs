//! Editable campaign configuration.
//!
//! A `CampaignSettings` value is what versions snapshot and what publishing
//! copies back onto the campaign row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::FieldError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignSettings {
    pub title: String,
    pub internal_title: Option<String>,
    pub description: Option<String>,
    /// `None` means unlimited
    pub capacity_total: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,

    pub require_email: bool,
    pub require_phone: bool,
    pub require_invite_code: bool,
    pub show_scarcity: bool,
    pub test_mode: bool,
    pub kiosk_mode: bool,
    pub allow_international: bool,
    pub success_message: Option<String>,
}

impl Default for CampaignSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            internal_title: None,
            description: None,
            capacity_total: None,
            starts_at: None,
            ends_at: None,
            require_email: true,
            require_phone: false,
            require_invite_code: false,
            show_scarcity: false,
            test_mode: false,
            kiosk_mode: false,
            allow_international: false,
            success_message: None,
        }
    }
}

impl CampaignSettings {
    /// Trim text fields, turning blanks into `None`.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.internal_title = trimmed(self.internal_title);
        self.description = trimmed(self.description);
        self.success_message = trimmed(self.success_message);
        self
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "is required"));
        }
        if matches!(self.capacity_total, Some(n) if n < 1) {
            errors.push(FieldError::new("capacity_total", "must be at least 1"));
        }
        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at) {
            if ends <= starts {
                errors.push(FieldError::new("ends_at", "must be after starts_at"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn settings(title: &str) -> CampaignSettings {
        CampaignSettings {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_require_email() {
        let s: CampaignSettings = serde_json::from_str(r#"{"title":"Kin"}"#).unwrap();
        assert!(s.require_email);
        assert!(!s.allow_international);
        assert_eq!(s.capacity_total, None);
    }

    #[test]
    fn blank_title_is_rejected() {
        let errors = settings("  ").validate().unwrap_err();
        assert_eq!(errors[0].field, "title");
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut s = settings("Kin");
        s.capacity_total = Some(0);
        let errors = s.validate().unwrap_err();
        assert_eq!(errors[0].field, "capacity_total");
    }

    #[test]
    fn window_must_move_forward() {
        let now = Utc::now();
        let mut s = settings("Kin");
        s.starts_at = Some(now);
        s.ends_at = Some(now - Duration::hours(1));
        assert_eq!(s.validate().unwrap_err()[0].field, "ends_at");

        s.ends_at = Some(now + Duration::hours(1));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn normalization_drops_blank_text() {
        let s = CampaignSettings {
            title: "  Kin drop  ".into(),
            description: Some("   ".into()),
            success_message: Some(" Thanks! ".into()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(s.title, "Kin drop");
        assert_eq!(s.description, None);
        assert_eq!(s.success_message.as_deref(), Some("Thanks!"));
    }
}
