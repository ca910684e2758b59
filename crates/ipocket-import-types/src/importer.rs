//! Importer trait implemented by every input format

use std::collections::HashMap;

use crate::bundle::ImportBundle;
use crate::error::ImportParseError;

/// Raw import inputs keyed by logical name
///
/// The bundle importer expects a `bundle` key; the CSV importer reads
/// `hosts` and/or `ip_assets`.
pub type ImportInputs = HashMap<String, Vec<u8>>;

/// Per-import knobs applied to parsed IP-asset drafts
///
/// Entries may override these per record (bundle JSON carries optional
/// `merge_tags`/`preserve_existing_notes` booleans); the options provide
/// the defaults for entries that stay silent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub merge_tags: bool,
    pub preserve_existing_notes: bool,
}

/// An input format that can be turned into an [`ImportBundle`]
///
/// Implementations only parse; they never touch storage. All referential
/// and field-level checking happens in the validator afterwards.
pub trait Importer: Send + Sync {
    fn parse(
        &self,
        inputs: &ImportInputs,
        options: &ImportOptions,
    ) -> Result<ImportBundle, ImportParseError>;
}
