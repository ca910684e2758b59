//! Helpers shared by all connectors

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use ipocket_database::DbConnection;
use ipocket_entities::{users, IpAssetType};
use ipocket_import::{run_import, BundleImporter, ImportAuditContext};
use ipocket_import_types::{
    BundleDocument, BundleIpAssetEntry, ImportApplyResult, ImportInputs, ImportOptions,
};
use ipocket_inventory::InventoryResult;

use crate::error::ConnectorError;

/// Per-run settings applied to every extracted IP asset
#[derive(Debug, Clone)]
pub struct AssetDefaults {
    pub asset_type: IpAssetType,
    pub project_name: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Fixed note for every asset; an explicit note is always "provided"
    /// so the importer can tell it apart from silence
    pub note: Option<String>,
}

impl Default for AssetDefaults {
    fn default() -> Self {
        Self {
            asset_type: IpAssetType::Other,
            project_name: None,
            tags: None,
            note: None,
        }
    }
}

impl AssetDefaults {
    /// Stamp the defaults onto a fresh asset entry.
    pub(crate) fn apply(&self, mut entry: BundleIpAssetEntry) -> BundleIpAssetEntry {
        entry.asset_type = self.asset_type.to_string();
        entry.archived = Some(false);
        if let Some(project_name) = &self.project_name {
            entry.project_name = Some(project_name.clone());
        }
        if let Some(tags) = &self.tags {
            let prepared: Vec<String> = tags
                .iter()
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect();
            if !prepared.is_empty() {
                entry.tags = Some(prepared);
                entry.merge_tags = Some(true);
            }
        }
        if let Some(note) = &self.note {
            entry.notes = Some(note.clone());
            entry.notes_provided = Some(true);
        }
        entry
    }
}

/// Parse a candidate as a usable IPv4 address, in canonical form.
pub(crate) fn normalize_ipv4(value: &str) -> Option<Ipv4Addr> {
    value.trim().parse::<Ipv4Addr>().ok()
}

/// Unwrap the address part of the host forms external systems hand out:
/// `inet[10.0.0.5:9300]`, `/10.0.0.5`, `[::1]:9200`, `10.0.0.5:9200`.
pub(crate) fn extract_host_candidate(value: &str) -> String {
    let mut candidate = value.trim();
    if candidate.is_empty() {
        return String::new();
    }

    if let Some(inner) = candidate
        .strip_prefix("inet[")
        .and_then(|rest| rest.strip_suffix(']'))
    {
        candidate = inner.trim();
    }

    if candidate.len() > 1 {
        if let Some(stripped) = candidate.strip_prefix('/') {
            candidate = stripped;
        }
    }

    if let Some(rest) = candidate.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return rest[..end].to_string();
        }
    }

    if candidate.matches(':').count() == 1 {
        if let Some((host, port)) = candidate.rsplit_once(':') {
            if !host.is_empty() && !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) {
                return host.to_string();
            }
        }
    }

    candidate.to_string()
}

/// Why a raw candidate cannot be used, for warning messages.
pub(crate) fn candidate_rejection(raw: &str, source: &str) -> String {
    let host = extract_host_candidate(raw);
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => format!(
            "source '{source}' value '{raw}' resolved to IPv6, but only IPv4 is supported."
        ),
        Ok(IpAddr::V4(v4)) if v4.is_loopback() => {
            format!("loopback IP '{v4}' is not allowed.")
        }
        Ok(_) => format!("source '{source}' value '{raw}' is not a usable IPv4 address."),
        Err(_) => format!(
            "source '{source}' value '{raw}' does not contain a valid IPv4 address."
        ),
    }
}

/// Wrap prepared assets into a bundle document, deduplicating by IP.
pub fn build_ip_asset_bundle(
    ip_assets: Vec<BundleIpAssetEntry>,
    exported_at: Option<String>,
) -> (BundleDocument, Vec<String>) {
    let timestamp = exported_at.unwrap_or_else(|| {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    });
    let mut document = BundleDocument::new(timestamp);
    let mut warnings = Vec::new();
    let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();

    for asset in ip_assets {
        let ip_address = asset.ip_address.trim().to_string();
        if ip_address.is_empty() {
            warnings.push("Skipped asset with empty ip_address.".to_string());
            continue;
        }
        if !seen.insert(ip_address.clone()) {
            warnings.push(format!("Duplicate IP '{ip_address}' skipped in bundle build."));
            continue;
        }
        document.data.ip_assets.push(asset);
    }

    (document, warnings)
}

/// Pretty-print a bundle document to a file, newline-terminated.
pub fn write_bundle_json(
    document: &BundleDocument,
    output_path: &Path,
) -> Result<(), ConnectorError> {
    let mut payload = serde_json::to_string_pretty(document)
        .map_err(|e| ConnectorError::InvalidPayload(e.to_string()))?;
    payload.push('\n');
    std::fs::write(output_path, payload)?;
    info!("Bundle written to {}", output_path.display());
    Ok(())
}

/// Feed a bundle document straight into the local import pipeline.
pub async fn import_bundle_via_pipeline(
    db: &Arc<DbConnection>,
    document: &BundleDocument,
    source: &str,
    user: Option<users::Model>,
    dry_run: bool,
) -> InventoryResult<ImportApplyResult> {
    let payload = serde_json::to_vec(document)
        .map_err(|e| ipocket_inventory::InventoryError::InvalidInput(e.to_string()))?;
    let mut inputs = ImportInputs::new();
    inputs.insert("bundle".to_string(), payload);

    let context = ImportAuditContext {
        user,
        source: format!("connector_{source}"),
        mode: if dry_run { "dry-run" } else { "apply" }.to_string(),
        input_label: format!("connector:{source}"),
    };
    run_import(
        db,
        &BundleImporter,
        &inputs,
        &ImportOptions::default(),
        dry_run,
        Some(&context),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host_candidate_forms() {
        assert_eq!(extract_host_candidate("10.0.0.5"), "10.0.0.5");
        assert_eq!(extract_host_candidate("10.0.0.5:9200"), "10.0.0.5");
        assert_eq!(extract_host_candidate("inet[10.0.0.5:9300]"), "10.0.0.5");
        assert_eq!(extract_host_candidate("/10.0.0.5"), "10.0.0.5");
        assert_eq!(extract_host_candidate("[::1]:9200"), "::1");
        assert_eq!(extract_host_candidate("  node-1:9100  "), "node-1");
        assert_eq!(extract_host_candidate("node-1"), "node-1");
    }

    #[test]
    fn test_normalize_ipv4() {
        assert_eq!(
            normalize_ipv4(" 10.0.0.5 "),
            Some(Ipv4Addr::new(10, 0, 0, 5))
        );
        assert_eq!(normalize_ipv4("::1"), None);
        assert_eq!(normalize_ipv4("node-1"), None);
    }

    #[test]
    fn test_candidate_rejection_reasons() {
        assert!(candidate_rejection("[::1]:9200", "ip").contains("IPv6"));
        assert!(candidate_rejection("127.0.0.1:9200", "ip").contains("loopback"));
        assert!(candidate_rejection("node-1:9100", "host").contains("does not contain"));
    }

    #[test]
    fn test_build_bundle_dedups_and_warns() {
        let assets = vec![
            BundleIpAssetEntry::new("10.0.0.5", "OS"),
            BundleIpAssetEntry::new("10.0.0.5", "VM"),
            BundleIpAssetEntry::new("", "OS"),
        ];
        let (document, warnings) = build_ip_asset_bundle(assets, Some("2025-06-01T12:00:00Z".into()));
        assert_eq!(document.data.ip_assets.len(), 1);
        assert_eq!(document.schema_version, "1");
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Duplicate IP '10.0.0.5'"));
    }

    #[test]
    fn test_defaults_apply_tags_and_note() {
        let defaults = AssetDefaults {
            asset_type: IpAssetType::Vm,
            project_name: Some("Core".to_string()),
            tags: Some(vec![" es ".to_string(), "".to_string()]),
            note: Some("imported".to_string()),
        };
        let entry = defaults.apply(BundleIpAssetEntry::new("10.0.0.5", "OTHER"));
        assert_eq!(entry.asset_type, "VM");
        assert_eq!(entry.project_name.as_deref(), Some("Core"));
        assert_eq!(entry.tags, Some(vec!["es".to_string()]));
        assert_eq!(entry.merge_tags, Some(true));
        assert_eq!(entry.notes.as_deref(), Some("imported"));
        assert_eq!(entry.notes_provided, Some(true));
        assert_eq!(entry.archived, Some(false));
    }
}
