/// Shortest payload accepted as an answer
pub const MIN_VALID_LENGTH: usize = 20;

const SENTINEL_FRAGMENT: &str = "no ";

/// Whether a stored or cached payload may be returned as authoritative.
///
/// Short payloads and anything containing the "no " fragment (the shape of
/// every "No ... found" sentinel) are rejected.
pub fn is_valid_payload(value: &str) -> bool {
    value.chars().count() >= MIN_VALID_LENGTH && !value.to_lowercase().contains(SENTINEL_FRAGMENT)
}
