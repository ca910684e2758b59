//! Parse failure for import inputs

use thiserror::Error;

/// Fatal parse error; blocks the pipeline before any storage access.
///
/// The location names the offending input piece (`schema_version`,
/// `data.hosts[2]`, `hosts.csv`, ...) and defaults to `import` when the
/// failure has no narrower anchor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ImportParseError {
    pub message: String,
    pub location: String,
}

impl ImportParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: "import".to_string(),
        }
    }

    pub fn at(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: location.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_location() {
        let err = ImportParseError::new("Invalid JSON payload.");
        assert_eq!(err.location, "import");
        assert_eq!(err.to_string(), "Invalid JSON payload.");
    }

    #[test]
    fn test_located_error() {
        let err = ImportParseError::at("Expected a list.", "data.vendors");
        assert_eq!(err.location, "data.vendors");
    }
}
