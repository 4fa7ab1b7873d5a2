use uuid::Uuid;

/// Characters used for human-typed codes (no 0/O, 1/I).
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CODE_LENGTH: usize = 8;

/// Random 32-character token for pre-created claim links.
///
/// A v4 UUID carries 122 random bits, which is plenty for an unguessable link.
pub fn claim_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Random code from `CODE_ALPHABET`, optionally prefixed (`KIN-7Q2M9XHA`).
pub fn random_code(prefix: Option<&str>) -> String {
    // 256 is a multiple of the alphabet size, so `% len` has no bias.
    // Bytes 6 and 8 carry the UUID version and variant bits.
    let bytes = Uuid::new_v4().into_bytes();
    let body: String = bytes
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 6 && *i != 8)
        .map(|(_, b)| b)
        .take(CODE_LENGTH)
        .map(|b| CODE_ALPHABET[*b as usize % CODE_ALPHABET.len()] as char)
        .collect();

    match prefix.map(normalize_code).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}-{}", prefix, body),
        None => body,
    }
}

/// Codes compare case-insensitively and ignore whitespace.
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}
