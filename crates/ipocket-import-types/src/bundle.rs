//! Draft entities parsed from import inputs
//!
//! Drafts live for one import call: parse fills them in, validation checks
//! them against current state and apply turns them into storage calls.

use ipocket_core::FieldUpdate;

/// Provenance pointer attached to every draft entity
///
/// Examples: `data.hosts[2]`, `hosts.csv:line 5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSource {
    pub location: String,
}

impl ImportSource {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Derive a field-level pointer, e.g. `data.hosts[2].vendor_name`.
    pub fn with_field(&self, field: &str) -> Self {
        Self {
            location: format!("{}.{}", self.location, field),
        }
    }
}

/// Vendor draft; vendors only carry a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportVendor {
    pub name: String,
    pub source: ImportSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportProject {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub source: ImportSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportHost {
    pub name: String,
    pub notes: Option<String>,
    pub vendor_name: Option<String>,
    /// CSV convenience column; drives derived IP-asset drafts
    pub project_name: Option<String>,
    /// CSV convenience column; expands to an OS-typed IP-asset draft
    pub os_ip: Option<String>,
    /// CSV convenience column; expands to a BMC-typed IP-asset draft
    pub bmc_ip: Option<String>,
    pub source: ImportSource,
}

impl ImportHost {
    pub fn named(name: impl Into<String>, source: ImportSource) -> Self {
        Self {
            name: name.into(),
            notes: None,
            vendor_name: None,
            project_name: None,
            os_ip: None,
            bmc_ip: None,
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportIPAsset {
    pub ip_address: String,
    /// Raw asset type string; normalized during validation/apply
    pub asset_type: String,
    pub project_name: Option<String>,
    pub host_name: Option<String>,
    /// Tri-state: absent keys parse to `Unspecified`, an explicit clear to
    /// `Clear`
    pub notes: FieldUpdate<String>,
    /// `None` leaves the stored flag alone
    pub archived: Option<bool>,
    /// `None` leaves tags untouched; an empty list clears them
    pub tags: Option<Vec<String>>,
    /// Union-merge instead of replacing the tag set on update
    pub merge_tags: bool,
    /// Keep non-empty stored notes even when the draft supplies new ones
    pub preserve_existing_notes: bool,
    pub source: ImportSource,
}

impl ImportIPAsset {
    pub fn new(
        ip_address: impl Into<String>,
        asset_type: impl Into<String>,
        source: ImportSource,
    ) -> Self {
        Self {
            ip_address: ip_address.into(),
            asset_type: asset_type.into(),
            project_name: None,
            host_name: None,
            notes: FieldUpdate::Unspecified,
            archived: None,
            tags: None,
            merge_tags: false,
            preserve_existing_notes: false,
            source,
        }
    }
}

/// Container for one parsed import, in apply order
#[derive(Debug, Clone, Default)]
pub struct ImportBundle {
    pub vendors: Vec<ImportVendor>,
    pub projects: Vec<ImportProject>,
    pub hosts: Vec<ImportHost>,
    pub ip_assets: Vec<ImportIPAsset>,
}

impl ImportBundle {
    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
            && self.projects.is_empty()
            && self.hosts.is_empty()
            && self.ip_assets.is_empty()
    }
}

/// Reference to an entity resolved during apply
///
/// `Pending` marks a record a dry run would have created; it carries the
/// draft's batch index so later phases can resolve same-batch references
/// without any row existing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Existing(i32),
    Pending(usize),
}

impl EntityRef {
    /// The real row id, if the entity exists in storage
    pub fn existing_id(&self) -> Option<i32> {
        match self {
            EntityRef::Existing(id) => Some(*id),
            EntityRef::Pending(_) => None,
        }
    }
}
