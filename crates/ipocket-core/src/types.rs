//! Custom types for common data structures

use chrono::{DateTime as ChronoDateTime, Utc};

/// Standard UTC DateTime type used across all ipocket crates
///
/// This is the canonical datetime type for:
/// - Database timestamp columns
/// - Bundle export timestamps (serializes as ISO 8601 with 'Z' suffix)
///
/// # Example
/// ```rust
/// use ipocket_core::UtcDateTime;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// pub struct Response {
///     pub created_at: UtcDateTime,
/// }
/// ```
pub type UtcDateTime = ChronoDateTime<Utc>;

/// Tri-state update for a nullable field
///
/// Update calls need to distinguish "caller did not mention this field"
/// from "caller wants it cleared" from "caller wants this value". A plain
/// `Option` collapses the first two, which is exactly the ambiguity this
/// type removes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    /// Field was not mentioned; keep whatever is stored
    #[default]
    Unspecified,
    /// Explicitly clear the stored value
    Clear,
    /// Replace the stored value
    Set(T),
}

impl<T> FieldUpdate<T> {
    /// Whether the caller said anything about this field
    pub fn is_specified(&self) -> bool {
        !matches!(self, FieldUpdate::Unspecified)
    }

    /// The new value, if one was set
    pub fn as_set(&self) -> Option<&T> {
        match self {
            FieldUpdate::Set(value) => Some(value),
            _ => None,
        }
    }

    /// Collapse into the value an update would write: `Set` and `Clear`
    /// map to `Some`/`None`, `Unspecified` keeps `existing`.
    pub fn resolve(self, existing: Option<T>) -> Option<T> {
        match self {
            FieldUpdate::Unspecified => existing,
            FieldUpdate::Clear => None,
            FieldUpdate::Set(value) => Some(value),
        }
    }

    /// The written value for a freshly created record (`Unspecified` and
    /// `Clear` both mean "no value yet").
    pub fn into_option(self) -> Option<T> {
        match self {
            FieldUpdate::Set(value) => Some(value),
            _ => None,
        }
    }

    /// Build from an optional value where `None` means "not mentioned".
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(value) => FieldUpdate::Set(value),
            None => FieldUpdate::Unspecified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_keeps_existing_when_unspecified() {
        let existing = Some("old".to_string());
        assert_eq!(
            FieldUpdate::<String>::Unspecified.resolve(existing.clone()),
            existing
        );
    }

    #[test]
    fn test_resolve_clear_and_set() {
        assert_eq!(
            FieldUpdate::<String>::Clear.resolve(Some("old".to_string())),
            None
        );
        assert_eq!(
            FieldUpdate::Set("new".to_string()).resolve(Some("old".to_string())),
            Some("new".to_string())
        );
    }

    #[test]
    fn test_from_option_round_trip() {
        assert_eq!(
            FieldUpdate::from_option(Some(1)),
            FieldUpdate::Set(1)
        );
        assert!(!FieldUpdate::<i32>::from_option(None).is_specified());
    }
}
