use sha2::{Digest, Sha256};

/// Street-suffix spellings folded together before hashing.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("street", "st"),
    ("avenue", "ave"),
    ("road", "rd"),
    ("boulevard", "blvd"),
    ("drive", "dr"),
    ("lane", "ln"),
    ("court", "ct"),
    ("place", "pl"),
    ("terrace", "ter"),
    ("highway", "hwy"),
    ("apartment", "apt"),
    ("suite", "ste"),
    ("north", "n"),
    ("south", "s"),
    ("east", "e"),
    ("west", "w"),
];

/// Lower-case, strip punctuation, collapse whitespace, fold suffixes.
pub fn normalize_address_part(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(|word| {
            ABBREVIATIONS
                .iter()
                .find(|(long, _)| *long == word)
                .map(|(_, short)| *short)
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Postal codes compare on alphanumerics only ("55401-1234" vs "554011234"
/// stay distinct, "SW1A 1AA" and "sw1a1aa" match).
fn normalize_postal(postal: &str) -> String {
    postal
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Generate an address fingerprint for duplicate detection
///
/// Two submissions of the same street address with different casing,
/// punctuation or suffix spelling produce the same fingerprint. Returns
/// `None` when there is no street line to compare.
pub fn address_fingerprint(
    address_line1: &str,
    address_line2: Option<&str>,
    postal_code: &str,
    country: &str,
) -> Option<String> {
    let line1 = normalize_address_part(address_line1);
    if line1.is_empty() {
        return None;
    }

    let line2 = address_line2.map(normalize_address_part).unwrap_or_default();
    let normalized = format!(
        "{}|{}|{}|{}",
        line1,
        line2,
        normalize_postal(postal_code),
        country.trim().to_lowercase()
    );

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    Some(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting_differences_collapse() {
        let a = address_fingerprint("123 Main Street", None, "55401", "US");
        let b = address_fingerprint("123  main st.", None, "55401", "us");
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn unit_numbers_distinguish_addresses() {
        let a = address_fingerprint("123 Main St", Some("Apt 1"), "55401", "US");
        let b = address_fingerprint("123 Main St", Some("Apartment 2"), "55401", "US");
        let c = address_fingerprint("123 Main St", Some("apartment #1"), "55401", "US");
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn postal_code_spacing_is_ignored() {
        let a = address_fingerprint("10 Downing St", None, "SW1A 2AA", "GB");
        let b = address_fingerprint("10 Downing Street", None, "sw1a2aa", "gb");
        assert_eq!(a, b);
    }

    #[test]
    fn blank_street_has_no_fingerprint() {
        assert_eq!(address_fingerprint("  ,. ", None, "55401", "US"), None);
    }

    #[test]
    fn normalization_folds_suffixes() {
        assert_eq!(
            normalize_address_part("42 North Oak Avenue, Suite 5"),
            "42 n oak ave ste 5"
        );
    }
}
