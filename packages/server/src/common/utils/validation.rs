use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,62}[a-z0-9])?$").unwrap();

    // Deliberately loose: one @, something on each side, a dot in the domain.
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9 ().\-]{7,20}$").unwrap();
}

/// Slugs that would collide with fixed routes of the claim site.
const RESERVED_SLUGS: &[&str] = &["admin", "api", "claim", "gift", "health", "login", "new"];

pub fn slug_problem(slug: &str) -> Option<&'static str> {
    if !SLUG_REGEX.is_match(slug) {
        return Some("must be 1-64 lowercase letters, digits or inner hyphens");
    }
    if RESERVED_SLUGS.contains(&slug) {
        return Some("is reserved");
    }
    None
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone) && phone.chars().filter(|c| c.is_ascii_digit()).count() >= 7
}

/// Trim a string and drop it entirely when nothing is left.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert_eq!(slug_problem("spring-kin-2025"), None);
        assert_eq!(slug_problem("a"), None);
        assert!(slug_problem("-leading").is_some());
        assert!(slug_problem("trailing-").is_some());
        assert!(slug_problem("Upper").is_some());
        assert!(slug_problem("").is_some());
        assert_eq!(slug_problem("admin"), Some("is reserved"));
        assert!(slug_problem(&"x".repeat(65)).is_some());
        assert_eq!(slug_problem(&"x".repeat(64)), None);
    }

    #[test]
    fn emails() {
        assert!(is_valid_email("kin@example.org"));
        assert!(!is_valid_email("kin@example"));
        assert!(!is_valid_email("kin example@x.org"));
        assert!(!is_valid_email("@example.org"));
    }

    #[test]
    fn phones() {
        assert!(is_valid_phone("+1 (612) 555-0100"));
        assert!(is_valid_phone("612.555.0100"));
        assert!(!is_valid_phone("555"));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn clean_drops_blank() {
        assert_eq!(clean(Some("  ".to_string())), None);
        assert_eq!(clean(Some(" x ".to_string())), Some("x".to_string()));
        assert_eq!(clean(None), None);
    }
}
