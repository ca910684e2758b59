//! Bundle wire format (`schema_version: "1"`)
//!
//! The typed form of the JSON snapshot produced by the exporter and the
//! connectors. The bundle *parser* deliberately does not use these types:
//! it walks raw JSON so it can coerce lenient inputs and attach precise
//! error locations.

use serde::{Deserialize, Serialize};

/// `app` field stamped into every exported bundle
pub const BUNDLE_APP_NAME: &str = "ipocket";

/// The only supported schema version; anything else is a hard parse error
pub const BUNDLE_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleDocument {
    pub app: String,
    pub schema_version: String,
    pub exported_at: String,
    pub data: BundleData,
}

impl BundleDocument {
    /// A bundle shell with the fixed header fields filled in
    pub fn new(exported_at: impl Into<String>) -> Self {
        Self {
            app: BUNDLE_APP_NAME.to_string(),
            schema_version: BUNDLE_SCHEMA_VERSION.to_string(),
            exported_at: exported_at.into(),
            data: BundleData::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleData {
    pub vendors: Vec<BundleVendorEntry>,
    pub projects: Vec<BundleProjectEntry>,
    pub hosts: Vec<BundleHostEntry>,
    pub ip_assets: Vec<BundleIpAssetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleVendorEntry {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleProjectEntry {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleHostEntry {
    pub name: String,
    pub notes: Option<String>,
    pub vendor_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleIpAssetEntry {
    pub ip_address: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub project_name: Option<String>,
    pub host_name: Option<String>,
    pub notes: Option<String>,
    pub archived: Option<bool>,
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_tags: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_provided: Option<bool>,
}

impl BundleIpAssetEntry {
    pub fn new(ip_address: impl Into<String>, asset_type: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            asset_type: asset_type.into(),
            project_name: None,
            host_name: None,
            notes: None,
            archived: None,
            tags: None,
            merge_tags: None,
            notes_provided: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_serializes_wire_shape() {
        let mut doc = BundleDocument::new("2025-06-01T12:00:00Z");
        doc.data.vendors.push(BundleVendorEntry {
            name: "Dell".to_string(),
        });
        let mut asset = BundleIpAssetEntry::new("10.0.0.5", "OS");
        asset.archived = Some(false);
        doc.data.ip_assets.push(asset);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["app"], "ipocket");
        assert_eq!(json["schema_version"], "1");
        assert_eq!(json["data"]["vendors"][0]["name"], "Dell");
        assert_eq!(json["data"]["ip_assets"][0]["type"], "OS");
        // Optional knobs are omitted rather than serialized as null
        assert!(json["data"]["ip_assets"][0].get("merge_tags").is_none());
    }

    #[test]
    fn test_document_round_trips() {
        let doc = BundleDocument::new("2025-06-01T12:00:00Z");
        let text = serde_json::to_string(&doc).unwrap();
        let parsed: BundleDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.schema_version, BUNDLE_SCHEMA_VERSION);
        assert!(parsed.data.ip_assets.is_empty());
    }
}
