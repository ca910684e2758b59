//! Referential and field-level validation of a parsed bundle
//!
//! A reference is valid if it resolves against the current store *or*
//! against names declared elsewhere in the same batch, so a bundle can
//! introduce a project and reference it from a host in one shot. Issues
//! are collected exhaustively; nothing here mutates storage.

use std::collections::HashSet;
use std::sync::Arc;

use ipocket_core::{is_valid_ip, normalize_hex_color, normalize_tag_name};
use ipocket_database::DbConnection;
use ipocket_entities::IpAssetType;
use ipocket_import_types::{ImportBundle, ImportIssue, ImportValidationResult};
use ipocket_inventory::{HostService, InventoryResult, ProjectService, VendorService};

pub async fn validate_bundle(
    db: &Arc<DbConnection>,
    bundle: &ImportBundle,
) -> InventoryResult<ImportValidationResult> {
    let mut result = ImportValidationResult::default();

    let batch_vendor_names: HashSet<String> = bundle
        .vendors
        .iter()
        .map(|vendor| vendor.name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    let batch_project_names: HashSet<String> = bundle
        .projects
        .iter()
        .map(|project| project.name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    let batch_host_names: HashSet<String> = bundle
        .hosts
        .iter()
        .map(|host| host.name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    let existing_vendor_names: HashSet<String> = VendorService::new(db.clone())
        .list()
        .await?
        .into_iter()
        .map(|vendor| vendor.name)
        .collect();
    let existing_project_names: HashSet<String> = ProjectService::new(db.clone())
        .list()
        .await?
        .into_iter()
        .map(|project| project.name)
        .collect();
    let existing_host_names: HashSet<String> = HostService::new(db.clone())
        .list()
        .await?
        .into_iter()
        .map(|host| host.name)
        .collect();

    for vendor in &bundle.vendors {
        if vendor.name.trim().is_empty() {
            result
                .errors
                .push(ImportIssue::error(&vendor.source.location, "Vendor name is required."));
        }
    }

    for project in &bundle.projects {
        if project.name.trim().is_empty() {
            result
                .errors
                .push(ImportIssue::error(&project.source.location, "Project name is required."));
        }
        if let Some(color) = &project.color {
            if let Err(err) = normalize_hex_color(color) {
                result.errors.push(ImportIssue::error(
                    project.source.with_field("color").location,
                    err.to_string(),
                ));
            }
        }
    }

    for host in &bundle.hosts {
        if host.name.trim().is_empty() {
            result
                .errors
                .push(ImportIssue::error(&host.source.location, "Host name is required."));
        }
        if let Some(vendor_name) = &host.vendor_name {
            if !batch_vendor_names.contains(vendor_name)
                && !existing_vendor_names.contains(vendor_name)
            {
                result.errors.push(ImportIssue::error(
                    host.source.with_field("vendor_name").location,
                    "Vendor does not exist.",
                ));
            }
        }
    }

    for asset in &bundle.ip_assets {
        if asset.ip_address.trim().is_empty() {
            result
                .errors
                .push(ImportIssue::error(&asset.source.location, "IP address is required."));
        } else if !is_valid_ip(&asset.ip_address) {
            result.errors.push(ImportIssue::error(
                asset.source.with_field("ip_address").location,
                "Invalid IP address.",
            ));
        }

        if asset.asset_type.trim().is_empty() {
            result.errors.push(ImportIssue::error(
                asset.source.with_field("type").location,
                "Asset type is required.",
            ));
        } else if IpAssetType::normalize(&asset.asset_type).is_err() {
            result.errors.push(ImportIssue::error(
                asset.source.with_field("type").location,
                "Invalid asset type. Use OS, BMC, VM, VIP, OTHER.",
            ));
        }

        if let Some(project_name) = &asset.project_name {
            if !batch_project_names.contains(project_name)
                && !existing_project_names.contains(project_name)
            {
                result.errors.push(ImportIssue::error(
                    asset.source.with_field("project_name").location,
                    "Project does not exist.",
                ));
            }
        }

        if let Some(host_name) = &asset.host_name {
            if !batch_host_names.contains(host_name) && !existing_host_names.contains(host_name) {
                result.errors.push(ImportIssue::error(
                    asset.source.with_field("host_name").location,
                    "Host does not exist.",
                ));
            }
        }

        if let Some(tags) = &asset.tags {
            for tag in tags {
                if let Err(err) = normalize_tag_name(tag) {
                    result.errors.push(ImportIssue::error(
                        asset.source.with_field("tags").location,
                        err.to_string(),
                    ));
                }
            }
        }
    }

    Ok(result)
}
