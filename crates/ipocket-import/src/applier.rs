//! Diff/upsert engine for validated bundles
//!
//! Entity kinds are processed in dependency order (vendors, projects,
//! hosts, then IP assets) so later phases can resolve references created
//! by earlier ones. Each phase snapshots current rows once, classifies
//! every draft as create/update/skip, and only touches storage in apply
//! mode. Dry runs record [`EntityRef::Pending`] markers so same-batch
//! references still resolve without any row existing.
//!
//! The phases are deliberately not wrapped in one transaction: each
//! storage call commits on its own, so a mid-batch failure leaves earlier
//! phases applied. Callers treat the whole run as non-atomic.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use ipocket_core::{normalize_tag_names, FieldUpdate};
use ipocket_database::DbConnection;
use ipocket_entities::IpAssetType;
use ipocket_import_types::{
    EntityRef, ImportApplyResult, ImportBundle, ImportIssue, ImportSummary,
};
use ipocket_inventory::{
    CreateIpAsset, HostService, InventoryError, InventoryResult, IpAssetService, ProjectService,
    TagService, UpdateIpAsset, VendorService,
};

/// Apply a validated bundle against the store, or forecast the apply when
/// `dry_run` is set. Counts are identical in both modes.
pub async fn apply_bundle(
    db: &Arc<DbConnection>,
    bundle: &ImportBundle,
    dry_run: bool,
) -> InventoryResult<ImportApplyResult> {
    let mut summary = ImportSummary::default();
    let mut warnings: Vec<ImportIssue> = Vec::new();

    let vendor_refs = upsert_vendors(db, bundle, &mut summary, dry_run).await?;
    let (project_refs, project_updates) =
        upsert_projects(db, bundle, &mut summary, dry_run).await?;
    let (host_refs, host_updates) =
        upsert_hosts(db, bundle, &vendor_refs, &mut summary, dry_run).await?;
    upsert_ip_assets(
        db,
        bundle,
        &project_refs,
        &host_refs,
        &mut summary,
        &mut warnings,
        dry_run,
    )
    .await?;

    if project_updates || host_updates {
        warnings.push(ImportIssue::warning(
            "import",
            "Some related records were updated based on import data.",
        ));
    }

    let total = summary.total();
    info!(
        "Bundle apply{}: create={} update={} skip={}",
        if dry_run { " (dry-run)" } else { "" },
        total.would_create,
        total.would_update,
        total.would_skip
    );

    Ok(ImportApplyResult {
        summary,
        errors: Vec::new(),
        warnings,
    })
}

async fn upsert_vendors(
    db: &Arc<DbConnection>,
    bundle: &ImportBundle,
    summary: &mut ImportSummary,
    dry_run: bool,
) -> InventoryResult<HashMap<String, EntityRef>> {
    let service = VendorService::new(db.clone());
    let mut refs: HashMap<String, EntityRef> = service
        .list()
        .await?
        .into_iter()
        .map(|vendor| (vendor.name, EntityRef::Existing(vendor.id)))
        .collect();

    for (index, vendor) in bundle.vendors.iter().enumerate() {
        let name = vendor.name.trim();
        if name.is_empty() {
            continue;
        }
        // Vendors only carry a name; a known name is always a skip
        if refs.contains_key(name) {
            summary.vendors.would_skip += 1;
            continue;
        }
        summary.vendors.would_create += 1;
        if dry_run {
            refs.insert(name.to_string(), EntityRef::Pending(index));
            continue;
        }
        let created = service.create(name).await?;
        debug!("Import created vendor '{}'", name);
        refs.insert(name.to_string(), EntityRef::Existing(created.id));
    }
    Ok(refs)
}

async fn upsert_projects(
    db: &Arc<DbConnection>,
    bundle: &ImportBundle,
    summary: &mut ImportSummary,
    dry_run: bool,
) -> InventoryResult<(HashMap<String, EntityRef>, bool)> {
    let service = ProjectService::new(db.clone());
    let existing: HashMap<String, ipocket_entities::projects::Model> = service
        .list()
        .await?
        .into_iter()
        .map(|project| (project.name.clone(), project))
        .collect();
    let mut refs: HashMap<String, EntityRef> = existing
        .values()
        .map(|project| (project.name.clone(), EntityRef::Existing(project.id)))
        .collect();
    let mut updated_any = false;

    for (index, project) in bundle.projects.iter().enumerate() {
        let name = project.name.trim();
        if name.is_empty() {
            continue;
        }
        let Some(existing_project) = existing.get(name) else {
            if refs.contains_key(name) {
                // Declared twice in one batch; the first draft wins
                summary.projects.would_skip += 1;
                continue;
            }
            summary.projects.would_create += 1;
            if dry_run {
                refs.insert(name.to_string(), EntityRef::Pending(index));
                continue;
            }
            let created = service
                .create(name, project.description.clone(), project.color.clone())
                .await?;
            debug!("Import created project '{}'", name);
            refs.insert(name.to_string(), EntityRef::Existing(created.id));
            continue;
        };

        let target_description = project
            .description
            .clone()
            .or_else(|| existing_project.description.clone());
        let target_color = project
            .color
            .clone()
            .unwrap_or_else(|| existing_project.color.clone());
        if target_description == existing_project.description
            && target_color == existing_project.color
        {
            summary.projects.would_skip += 1;
            continue;
        }
        summary.projects.would_update += 1;
        updated_any = true;
        if dry_run {
            continue;
        }
        service
            .update(
                existing_project.id,
                Some(name.to_string()),
                project.description.clone(),
                project.color.clone(),
            )
            .await?;
        debug!("Import updated project '{}'", name);
    }

    Ok((refs, updated_any))
}

async fn upsert_hosts(
    db: &Arc<DbConnection>,
    bundle: &ImportBundle,
    vendor_refs: &HashMap<String, EntityRef>,
    summary: &mut ImportSummary,
    dry_run: bool,
) -> InventoryResult<(HashMap<String, EntityRef>, bool)> {
    let service = HostService::new(db.clone());
    let existing: HashMap<String, ipocket_entities::hosts::Model> = service
        .list()
        .await?
        .into_iter()
        .map(|host| (host.name.clone(), host))
        .collect();
    let mut refs: HashMap<String, EntityRef> = existing
        .values()
        .map(|host| (host.name.clone(), EntityRef::Existing(host.id)))
        .collect();
    let mut updated_any = false;

    for (index, host) in bundle.hosts.iter().enumerate() {
        let name = host.name.trim();
        if name.is_empty() {
            continue;
        }
        let vendor_name = host
            .vendor_name
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let vendor_ref = vendor_name.and_then(|value| vendor_refs.get(value)).copied();

        let Some(existing_host) = existing.get(name) else {
            if refs.contains_key(name) {
                summary.hosts.would_skip += 1;
                continue;
            }
            summary.hosts.would_create += 1;
            if dry_run {
                refs.insert(name.to_string(), EntityRef::Pending(index));
                continue;
            }
            let created = service
                .create(
                    name,
                    host.notes.clone(),
                    vendor_ref.and_then(|r| r.existing_id()),
                )
                .await?;
            debug!("Import created host '{}'", name);
            refs.insert(name.to_string(), EntityRef::Existing(created.id));
            continue;
        };

        let existing_vendor_ref = existing_host.vendor_id.map(EntityRef::Existing);
        let target_notes = host.notes.clone().or_else(|| existing_host.notes.clone());
        let target_vendor_ref = if vendor_name.is_some() {
            vendor_ref
        } else {
            existing_vendor_ref
        };
        if target_notes == existing_host.notes && target_vendor_ref == existing_vendor_ref {
            summary.hosts.would_skip += 1;
            continue;
        }
        summary.hosts.would_update += 1;
        updated_any = true;
        if dry_run {
            continue;
        }
        service
            .update(
                existing_host.id,
                Some(name.to_string()),
                host.notes.clone(),
                vendor_ref.and_then(|r| r.existing_id()),
            )
            .await?;
        debug!("Import updated host '{}'", name);
    }

    Ok((refs, updated_any))
}

async fn upsert_ip_assets(
    db: &Arc<DbConnection>,
    bundle: &ImportBundle,
    project_refs: &HashMap<String, EntityRef>,
    host_refs: &HashMap<String, EntityRef>,
    summary: &mut ImportSummary,
    warnings: &mut Vec<ImportIssue>,
    dry_run: bool,
) -> InventoryResult<()> {
    let service = IpAssetService::new(db.clone());
    let tag_service = TagService::new(db.clone());

    let existing_assets = service.list_all().await?;
    let asset_ids: Vec<i32> = existing_assets.iter().map(|asset| asset.id).collect();
    let tag_map = tag_service.list_tags_for_ip_assets(&asset_ids).await?;
    let existing_by_ip: HashMap<String, ipocket_entities::ip_assets::Model> = existing_assets
        .into_iter()
        .map(|asset| (asset.ip_address.clone(), asset))
        .collect();

    let mut seen_ips: HashSet<String> = HashSet::new();

    for draft in &bundle.ip_assets {
        let ip_address = draft.ip_address.trim().to_string();
        if ip_address.is_empty() {
            continue;
        }
        if !seen_ips.insert(ip_address.clone()) {
            summary.ip_assets.would_skip += 1;
            warnings.push(ImportIssue::warning(
                &draft.source.location,
                "Duplicate IP address in import batch.",
            ));
            continue;
        }

        // Validation already vetted the type string
        let asset_type = IpAssetType::normalize(&draft.asset_type)
            .map_err(|e| InventoryError::InvalidInput(e.to_string()))?;
        let project_ref = draft
            .project_name
            .as_deref()
            .and_then(|name| project_refs.get(name))
            .copied();
        let host_ref = draft
            .host_name
            .as_deref()
            .and_then(|name| host_refs.get(name))
            .copied();

        let Some(existing) = existing_by_ip.get(&ip_address) else {
            summary.ip_assets.would_create += 1;
            if dry_run {
                continue;
            }
            let created = service
                .create(
                    CreateIpAsset {
                        ip_address: ip_address.clone(),
                        asset_type,
                        project_id: project_ref.and_then(|r| r.existing_id()),
                        host_id: host_ref.and_then(|r| r.existing_id()),
                        notes: draft.notes.clone().into_option(),
                        tags: draft.tags.clone(),
                    },
                    None,
                )
                .await?;
            debug!("Import created IP asset {}", ip_address);
            if draft.archived == Some(true) {
                service.set_archived(&created.ip_address, true).await?;
            }
            continue;
        };

        let existing_tags = tag_map.get(&existing.id).cloned().unwrap_or_default();
        let target_tags = match &draft.tags {
            None => existing_tags.clone(),
            Some(new_tags) if draft.merge_tags => {
                let mut combined = existing_tags.clone();
                combined.extend(new_tags.iter().cloned());
                normalize_tag_names(&combined)
            }
            Some(new_tags) => normalize_tag_names(new_tags),
        };

        let mut notes = draft.notes.clone();
        let existing_has_notes = existing
            .notes
            .as_deref()
            .is_some_and(|value| !value.is_empty());
        if notes.is_specified() && draft.preserve_existing_notes && existing_has_notes {
            notes = FieldUpdate::Unspecified;
        }
        let target_notes = notes.clone().resolve(existing.notes.clone());

        let existing_project_ref = existing.project_id.map(EntityRef::Existing);
        let existing_host_ref = existing.host_id.map(EntityRef::Existing);
        let target_project_ref = if draft.project_name.is_some() {
            project_ref
        } else {
            existing_project_ref
        };
        let target_host_ref = if draft.host_name.is_some() {
            host_ref
        } else {
            existing_host_ref
        };
        let target_archived = draft.archived.unwrap_or(existing.archived);

        let unchanged = asset_type == existing.asset_type
            && target_project_ref == existing_project_ref
            && target_host_ref == existing_host_ref
            && target_notes == existing.notes
            && target_archived == existing.archived
            && target_tags == existing_tags;
        if unchanged {
            summary.ip_assets.would_skip += 1;
            continue;
        }

        summary.ip_assets.would_update += 1;
        if dry_run {
            continue;
        }
        service
            .update(
                &ip_address,
                UpdateIpAsset {
                    asset_type: Some(asset_type),
                    project_id: if draft.project_name.is_some() {
                        FieldUpdate::from_option(project_ref.and_then(|r| r.existing_id()))
                    } else {
                        FieldUpdate::Unspecified
                    },
                    host_id: if draft.host_name.is_some() {
                        FieldUpdate::from_option(host_ref.and_then(|r| r.existing_id()))
                    } else {
                        FieldUpdate::Unspecified
                    },
                    notes,
                    tags: Some(target_tags),
                },
                None,
            )
            .await?;
        debug!("Import updated IP asset {}", ip_address);
        if let Some(archived) = draft.archived {
            service.set_archived(&ip_address, archived).await?;
        }
    }

    Ok(())
}
