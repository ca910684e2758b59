//! Issue vocabulary shared by validation and apply

use serde::{Deserialize, Serialize};

/// Severity of an import issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Error,
    Warning,
}

/// One problem or notice, tied to the input location that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportIssue {
    pub location: String,
    pub message: String,
    pub level: IssueLevel,
}

impl ImportIssue {
    pub fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
            level: IssueLevel::Error,
        }
    }

    pub fn warning(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
            level: IssueLevel::Warning,
        }
    }
}

/// Outcome of validating one bundle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportValidationResult {
    pub errors: Vec<ImportIssue>,
    pub warnings: Vec<ImportIssue>,
}

impl ImportValidationResult {
    /// A bundle may be applied only when no error-level issue was found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_ignores_warnings() {
        let mut result = ImportValidationResult::default();
        assert!(result.is_valid());

        result
            .warnings
            .push(ImportIssue::warning("import", "heads up"));
        assert!(result.is_valid());

        result
            .errors
            .push(ImportIssue::error("data.vendors[0]", "Vendor name is required."));
        assert!(!result.is_valid());
    }

    #[test]
    fn test_issue_serializes_level_lowercase() {
        let issue = ImportIssue::error("schema_version", "Unsupported schema_version (expected '1').");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["level"], "error");
    }
}
