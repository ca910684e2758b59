//! JSON bundle parser
//!
//! Walks the raw document instead of deserializing into the typed wire
//! structs so that lenient inputs (comma-separated tags, truthy strings
//! for `archived`) coerce cleanly and every shape error carries the exact
//! location that produced it.

use serde_json::{Map, Value};

use ipocket_core::{split_tag_string, FieldUpdate};
use ipocket_import_types::{
    ImportBundle, ImportHost, ImportIPAsset, ImportInputs, ImportOptions, ImportParseError,
    ImportProject, ImportSource, ImportVendor, Importer, BUNDLE_SCHEMA_VERSION,
};

/// Parses the `bundle` input (the `schema_version: "1"` JSON snapshot)
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleImporter;

impl Importer for BundleImporter {
    fn parse(
        &self,
        inputs: &ImportInputs,
        options: &ImportOptions,
    ) -> Result<ImportBundle, ImportParseError> {
        let raw = inputs
            .get("bundle")
            .ok_or_else(|| ImportParseError::new("Missing bundle.json input."))?;
        let payload: Value = serde_json::from_slice(raw)
            .map_err(|_| ImportParseError::new("Invalid JSON payload."))?;

        if payload.get("schema_version").and_then(Value::as_str) != Some(BUNDLE_SCHEMA_VERSION) {
            return Err(ImportParseError::at(
                "Unsupported schema_version (expected '1').",
                "schema_version",
            ));
        }
        let data = payload
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| ImportParseError::at("Missing data section.", "data"))?;

        let mut bundle = ImportBundle::default();
        for (entry, source) in entries(data.get("vendors"), "data.vendors")? {
            bundle.vendors.push(ImportVendor {
                name: string_field(entry, "name"),
                source,
            });
        }
        for (entry, source) in entries(data.get("projects"), "data.projects")? {
            bundle.projects.push(ImportProject {
                name: string_field(entry, "name"),
                description: optional_string(entry, "description"),
                color: optional_string(entry, "color"),
                source,
            });
        }
        for (entry, source) in entries(data.get("hosts"), "data.hosts")? {
            let mut host = ImportHost::named(string_field(entry, "name"), source);
            host.notes = optional_string(entry, "notes");
            host.vendor_name = optional_string(entry, "vendor_name");
            bundle.hosts.push(host);
        }
        for (entry, source) in entries(data.get("ip_assets"), "data.ip_assets")? {
            let mut asset =
                ImportIPAsset::new(string_field(entry, "ip_address"), string_field(entry, "type"), source);
            asset.project_name = optional_string(entry, "project_name");
            asset.host_name = optional_string(entry, "host_name");
            asset.notes = notes_field(entry);
            asset.archived = optional_bool(entry.get("archived"));
            asset.tags = tags_field(entry);
            asset.merge_tags = optional_bool(entry.get("merge_tags")).unwrap_or(options.merge_tags);
            asset.preserve_existing_notes = optional_bool(entry.get("preserve_existing_notes"))
                .unwrap_or(options.preserve_existing_notes);
            bundle.ip_assets.push(asset);
        }
        Ok(bundle)
    }
}

type Entry<'a> = (&'a Map<String, Value>, ImportSource);

/// Resolve a section into `(object, source)` pairs. Absent or null
/// sections are empty; anything that is not a list of objects fails with
/// a location-qualified error.
fn entries<'a>(
    section: Option<&'a Value>,
    base_path: &str,
) -> Result<Vec<Entry<'a>>, ImportParseError> {
    let section = match section {
        None => return Ok(Vec::new()),
        Some(Value::Null) => return Ok(Vec::new()),
        Some(value) => value,
    };
    let list = section
        .as_array()
        .ok_or_else(|| ImportParseError::at("Expected a list.", base_path))?;

    let mut result = Vec::with_capacity(list.len());
    for (index, entry) in list.iter().enumerate() {
        let location = format!("{base_path}[{index}]");
        let object = entry
            .as_object()
            .ok_or_else(|| ImportParseError::at("Expected object entries.", location.clone()))?;
        result.push((object, ImportSource::new(location)));
    }
    Ok(result)
}

/// Required string field: scalars coerce to their string form, everything
/// else (including absence) becomes the empty string the validator flags.
fn string_field(entry: &Map<String, Value>, key: &str) -> String {
    match entry.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Optional string field: null/absent/blank map to `None`, scalars coerce
/// and are trimmed.
fn optional_string(entry: &Map<String, Value>, key: &str) -> Option<String> {
    let value = match entry.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => return None,
    };
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Tri-state boolean with the lenient coercions the CSV/UI world needs:
/// real booleans pass through, numbers map through zero/non-zero, common
/// truthy/falsy tokens parse, anything else means "unspecified".
fn optional_bool(value: Option<&Value>) -> Option<bool> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::Number(n)) => Some(n.as_f64().unwrap_or(0.0) != 0.0),
        Some(Value::String(s)) => parse_bool_token(s),
        Some(_) => None,
    }
}

pub(crate) fn parse_bool_token(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "" => None,
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Tags accept either a list of strings or one comma-separated string.
fn tags_field(entry: &Map<String, Value>) -> Option<Vec<String>> {
    match entry.get("tags") {
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        Some(Value::String(s)) => Some(split_tag_string(s)),
        _ => None,
    }
}

/// Notes tri-state: a present string is `Set`, `notes_provided: true`
/// without a value is an explicit `Clear`, anything else leaves the
/// stored notes alone.
fn notes_field(entry: &Map<String, Value>) -> FieldUpdate<String> {
    match optional_string(entry, "notes") {
        Some(value) => FieldUpdate::Set(value),
        None => {
            if optional_bool(entry.get("notes_provided")).unwrap_or(false) {
                FieldUpdate::Clear
            } else {
                FieldUpdate::Unspecified
            }
        }
    }
}
