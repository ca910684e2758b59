//! Field validators shared by the UI forms, repository layer and importer
//!
//! These normalizers return the canonical stored form of a field or a
//! [`FieldError`] whose message is surfaced verbatim to callers.

use std::collections::BTreeSet;
use std::net::IpAddr;

use thiserror::Error;

/// Validation failure for a single field value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Invalid color. Use a hex value like #0ea5e9.")]
    InvalidHexColor,

    #[error("Invalid tag name. Use lowercase letters, digits, '-', '_' or '.'.")]
    InvalidTagName,
}

/// Normalize a hex color string.
///
/// Blank input is not an error; it means "use the default color" and maps
/// to `None`. Accepts `#rgb` and `#rrggbb`, lowercased on the way out.
pub fn normalize_hex_color(value: &str) -> Result<Option<String>, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let lowered = trimmed.to_lowercase();
    let digits = match lowered.strip_prefix('#') {
        Some(rest) => rest,
        None => return Err(FieldError::InvalidHexColor),
    };
    let valid_len = digits.len() == 3 || digits.len() == 6;
    if !valid_len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FieldError::InvalidHexColor);
    }
    Ok(Some(lowered))
}

/// Normalize a single tag name to its stored form.
///
/// Tags are stored lowercase with a limited charset so they stay usable in
/// query strings and Prometheus label values.
pub fn normalize_tag_name(value: &str) -> Result<String, FieldError> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() || normalized.len() > 64 {
        return Err(FieldError::InvalidTagName);
    }
    let valid = normalized
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(FieldError::InvalidTagName);
    }
    Ok(normalized)
}

/// Normalize a tag list: normalize each entry, drop blanks and invalid
/// names, dedup, and return the names sorted.
///
/// Callers that need per-entry errors use [`normalize_tag_name`] first;
/// this is the lenient form used once a batch already passed validation.
pub fn normalize_tag_names<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let set: BTreeSet<String> = values
        .iter()
        .filter_map(|value| normalize_tag_name(value.as_ref()).ok())
        .collect();
    set.into_iter().collect()
}

/// Split a comma-separated tag string into trimmed, non-empty parts.
pub fn split_tag_string(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a string parses as an IPv4 or IPv6 address.
pub fn is_valid_ip(value: &str) -> bool {
    value.trim().parse::<IpAddr>().is_ok()
}
