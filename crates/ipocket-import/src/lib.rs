//! Bundle import pipeline
//!
//! Four stages: parse (bundle JSON or CSV files into draft entities),
//! validate (referential and field checks against current state plus the
//! batch itself), apply (minimal create/update/skip plan with optional
//! dry run) and audit. `run_import` sequences them and short-circuits on
//! parse or validation failure.

pub mod applier;
pub mod export;
pub mod importers;
pub mod pipeline;
pub mod validator;

pub use applier::apply_bundle;
pub use export::export_bundle;
pub use importers::{BundleImporter, CsvImporter};
pub use pipeline::{run_import, ImportAuditContext};
pub use validator::validate_bundle;
