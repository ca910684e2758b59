//! Create/update/skip counters and the terminal pipeline result

use serde::{Deserialize, Serialize};

use crate::issue::ImportIssue;

/// Counters for one entity kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntitySummary {
    pub would_create: usize,
    pub would_update: usize,
    pub would_skip: usize,
}

/// One counter block per entity kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub vendors: ImportEntitySummary,
    pub projects: ImportEntitySummary,
    pub hosts: ImportEntitySummary,
    pub ip_assets: ImportEntitySummary,
}

impl ImportSummary {
    /// Aggregate counters across all entity kinds
    pub fn total(&self) -> ImportEntitySummary {
        ImportEntitySummary {
            would_create: self.vendors.would_create
                + self.projects.would_create
                + self.hosts.would_create
                + self.ip_assets.would_create,
            would_update: self.vendors.would_update
                + self.projects.would_update
                + self.hosts.would_update
                + self.ip_assets.would_update,
            would_skip: self.vendors.would_skip
                + self.projects.would_skip
                + self.hosts.would_skip
                + self.ip_assets.would_skip,
        }
    }
}

/// Terminal output of the import pipeline, identical in shape for parse
/// failures, validation failures and (dry-run or real) applies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportApplyResult {
    pub summary: ImportSummary,
    pub errors: Vec<ImportIssue>,
    pub warnings: Vec<ImportIssue>,
}

impl ImportApplyResult {
    /// A blocked pipeline run: no counters, only errors (and warnings).
    pub fn failed(errors: Vec<ImportIssue>, warnings: Vec<ImportIssue>) -> Self {
        Self {
            summary: ImportSummary::default(),
            errors,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_sums_all_kinds() {
        let summary = ImportSummary {
            vendors: ImportEntitySummary {
                would_create: 1,
                would_update: 0,
                would_skip: 2,
            },
            projects: ImportEntitySummary {
                would_create: 0,
                would_update: 3,
                would_skip: 0,
            },
            hosts: ImportEntitySummary {
                would_create: 2,
                would_update: 0,
                would_skip: 1,
            },
            ip_assets: ImportEntitySummary {
                would_create: 4,
                would_update: 1,
                would_skip: 0,
            },
        };
        let total = summary.total();
        assert_eq!(total.would_create, 7);
        assert_eq!(total.would_update, 4);
        assert_eq!(total.would_skip, 3);
    }
}
