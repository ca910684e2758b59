//! Shared types for the ipocket import system
//!
//! Draft entities, issue/summary DTOs and the importer trait. Everything
//! here is plain data; parsing and apply logic live in `ipocket-import`.

pub mod bundle;
pub mod document;
pub mod error;
pub mod importer;
pub mod issue;
pub mod summary;

pub use bundle::{
    EntityRef, ImportBundle, ImportHost, ImportIPAsset, ImportProject, ImportSource, ImportVendor,
};
pub use document::{
    BundleData, BundleDocument, BundleHostEntry, BundleIpAssetEntry, BundleProjectEntry,
    BundleVendorEntry, BUNDLE_APP_NAME, BUNDLE_SCHEMA_VERSION,
};
pub use error::ImportParseError;
pub use importer::{ImportInputs, ImportOptions, Importer};
pub use issue::{ImportIssue, ImportValidationResult, IssueLevel};
pub use summary::{ImportApplyResult, ImportEntitySummary, ImportSummary};
