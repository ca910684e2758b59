//! Bundle export
//!
//! Serializes the current inventory into the `schema_version: "1"` wire
//! document. Re-importing an export into an empty store reproduces the
//! same vendors, projects, hosts and IP assets (ids and timestamps
//! aside).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};

use ipocket_database::DbConnection;
use ipocket_import_types::{
    BundleDocument, BundleHostEntry, BundleIpAssetEntry, BundleProjectEntry, BundleVendorEntry,
};
use ipocket_inventory::{
    HostService, InventoryResult, IpAssetService, ProjectService, VendorService,
};

/// Export the inventory as a bundle document.
pub async fn export_bundle(
    db: &Arc<DbConnection>,
    include_archived: bool,
) -> InventoryResult<BundleDocument> {
    let mut document =
        BundleDocument::new(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

    let vendors = VendorService::new(db.clone()).list().await?;
    let vendor_names: HashMap<i32, String> = vendors
        .iter()
        .map(|vendor| (vendor.id, vendor.name.clone()))
        .collect();
    document.data.vendors = vendors
        .into_iter()
        .map(|vendor| BundleVendorEntry { name: vendor.name })
        .collect();

    document.data.projects = ProjectService::new(db.clone())
        .list()
        .await?
        .into_iter()
        .map(|project| BundleProjectEntry {
            name: project.name,
            description: project.description,
            color: Some(project.color),
        })
        .collect();

    document.data.hosts = HostService::new(db.clone())
        .list()
        .await?
        .into_iter()
        .map(|host| BundleHostEntry {
            name: host.name,
            notes: host.notes,
            vendor_name: host.vendor_id.and_then(|id| vendor_names.get(&id).cloned()),
        })
        .collect();

    document.data.ip_assets = IpAssetService::new(db.clone())
        .list_for_export(include_archived)
        .await?
        .into_iter()
        .map(|row| BundleIpAssetEntry {
            ip_address: row.ip_address,
            asset_type: row.asset_type.to_string(),
            project_name: row.project_name,
            host_name: row.host_name,
            notes: row.notes,
            archived: Some(row.archived),
            tags: Some(row.tags),
            merge_tags: None,
            notes_provided: None,
        })
        .collect();

    Ok(document)
}
