use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use ipocket_audit::AuditService;
use ipocket_core::{FieldUpdate, UtcDateTime};
use ipocket_database::DbConnection;
use ipocket_entities::{hosts, ip_assets, projects, users, IpAssetType};

use super::tag::TagService;
use super::types::InventoryResult;

const AUDIT_TARGET_TYPE: &str = "IP_ASSET";

/// Parameters for creating an IP asset
#[derive(Debug, Clone, Default)]
pub struct CreateIpAsset {
    pub ip_address: String,
    pub asset_type: IpAssetType,
    pub project_id: Option<i32>,
    pub host_id: Option<i32>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Parameters for updating an IP asset
///
/// `project_id`, `host_id` and `notes` are tri-state so callers can clear
/// a value without ambiguity; `tags` as `None` leaves the tag set alone
/// while `Some(vec![])` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateIpAsset {
    pub asset_type: Option<IpAssetType>,
    pub project_id: FieldUpdate<i32>,
    pub host_id: FieldUpdate<i32>,
    pub notes: FieldUpdate<String>,
    pub tags: Option<Vec<String>>,
}

/// One row of the bundle export listing
#[derive(Debug, Clone, Serialize)]
pub struct IpAssetExportRow {
    pub ip_address: String,
    #[serde(rename = "type")]
    pub asset_type: IpAssetType,
    pub project_name: Option<String>,
    pub host_name: Option<String>,
    pub notes: Option<String>,
    pub archived: bool,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
    pub tags: Vec<String>,
}

/// CRUD over IP assets, with tag links and audit trail entries
#[derive(Clone)]
pub struct IpAssetService {
    db: Arc<DbConnection>,
    tags: TagService,
    audit: Arc<AuditService>,
}

impl IpAssetService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        let tags = TagService::new(db.clone());
        let audit = Arc::new(AuditService::new(db.clone()));
        Self { db, tags, audit }
    }

    pub async fn create(
        &self,
        params: CreateIpAsset,
        user: Option<&users::Model>,
    ) -> InventoryResult<ip_assets::Model> {
        let asset = ip_assets::ActiveModel {
            ip_address: Set(params.ip_address.clone()),
            asset_type: Set(params.asset_type),
            project_id: Set(params.project_id),
            host_id: Set(params.host_id),
            notes: Set(params.notes.clone()),
            archived: Set(false),
            ..Default::default()
        };
        let created = asset.insert(self.db.as_ref()).await?;
        debug!("Created IP asset {}", created.ip_address);

        self.audit
            .create_audit_log(
                user,
                "CREATE",
                AUDIT_TARGET_TYPE,
                created.id,
                &created.ip_address,
                Some(format!(
                    "Created IP asset (type={}, project_id={:?}, host_id={:?}, notes={})",
                    created.asset_type,
                    created.project_id,
                    created.host_id,
                    created.notes.as_deref().unwrap_or("")
                )),
            )
            .await?;

        if let Some(tags) = params.tags {
            self.tags.set_ip_asset_tags(created.id, &tags).await?;
        }
        Ok(created)
    }

    pub async fn get_by_ip(&self, ip_address: &str) -> InventoryResult<Option<ip_assets::Model>> {
        Ok(ip_assets::Entity::find()
            .filter(ip_assets::Column::IpAddress.eq(ip_address))
            .one(self.db.as_ref())
            .await?)
    }

    pub async fn get_by_id(&self, asset_id: i32) -> InventoryResult<Option<ip_assets::Model>> {
        Ok(ip_assets::Entity::find_by_id(asset_id)
            .one(self.db.as_ref())
            .await?)
    }

    /// Every asset, archived ones included. Used to snapshot state before
    /// a bulk upsert.
    pub async fn list_all(&self) -> InventoryResult<Vec<ip_assets::Model>> {
        Ok(ip_assets::Entity::find()
            .order_by_asc(ip_assets::Column::IpAddress)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn list_active(&self) -> InventoryResult<Vec<ip_assets::Model>> {
        Ok(ip_assets::Entity::find()
            .filter(ip_assets::Column::Archived.eq(false))
            .order_by_asc(ip_assets::Column::IpAddress)
            .all(self.db.as_ref())
            .await?)
    }

    /// Update an asset in place. Returns `None` when the IP is unknown and
    /// the unchanged row when nothing would differ (no write, no audit).
    pub async fn update(
        &self,
        ip_address: &str,
        changes: UpdateIpAsset,
        user: Option<&users::Model>,
    ) -> InventoryResult<Option<ip_assets::Model>> {
        let Some(existing) = self.get_by_ip(ip_address).await? else {
            return Ok(None);
        };

        // Blank notes are stored as NULL
        let notes = match changes.notes {
            FieldUpdate::Set(value) if value.trim().is_empty() => FieldUpdate::Clear,
            other => other,
        };

        let updated_type = changes.asset_type.unwrap_or(existing.asset_type);
        let updated_project_id = changes.project_id.clone().resolve(existing.project_id);
        let updated_host_id = changes.host_id.clone().resolve(existing.host_id);
        let updated_notes = notes.clone().resolve(existing.notes.clone());

        let fields_changed = existing.asset_type != updated_type
            || existing.project_id != updated_project_id
            || existing.host_id != updated_host_id
            || existing.notes != updated_notes;

        let mut tags_before: Option<Vec<String>> = None;
        let mut tags_after: Option<Vec<String>> = None;
        if let Some(new_tags) = &changes.tags {
            let current = self
                .tags
                .list_tags_for_ip_assets(&[existing.id])
                .await?
                .remove(&existing.id)
                .unwrap_or_default();
            let normalized = ipocket_core::normalize_tag_names(new_tags);
            if current != normalized {
                tags_before = Some(current);
                tags_after = Some(normalized);
            }
        }
        let tags_changed = tags_after.is_some();

        if !fields_changed && !tags_changed {
            return Ok(Some(existing));
        }

        let mut active: ip_assets::ActiveModel = existing.clone().into();
        if fields_changed {
            active.asset_type = Set(updated_type);
            active.project_id = Set(updated_project_id);
            active.host_id = Set(updated_host_id);
            active.notes = Set(updated_notes);
        }
        // before_save refreshes updated_at, so tag-only changes still touch the row
        let updated = active.update(self.db.as_ref()).await?;

        let summary = self
            .summarize_changes(&existing, &updated, tags_before.as_deref(), tags_after.as_deref())
            .await?;
        self.audit
            .create_audit_log(
                user,
                "UPDATE",
                AUDIT_TARGET_TYPE,
                updated.id,
                &updated.ip_address,
                Some(summary),
            )
            .await?;

        if let Some(tags) = tags_after {
            self.tags.set_ip_asset_tags(updated.id, &tags).await?;
        }
        Ok(Some(updated))
    }

    /// Flip the archived flag. Returns whether a row was touched.
    pub async fn set_archived(&self, ip_address: &str, archived: bool) -> InventoryResult<bool> {
        let Some(existing) = self.get_by_ip(ip_address).await? else {
            return Ok(false);
        };
        let mut active: ip_assets::ActiveModel = existing.into();
        active.archived = Set(archived);
        active.update(self.db.as_ref()).await?;
        Ok(true)
    }

    pub async fn delete(
        &self,
        ip_address: &str,
        user: Option<&users::Model>,
    ) -> InventoryResult<bool> {
        let Some(existing) = self.get_by_ip(ip_address).await? else {
            return Ok(false);
        };
        ip_assets::Entity::delete_by_id(existing.id)
            .exec(self.db.as_ref())
            .await?;
        self.audit
            .create_audit_log(
                user,
                "DELETE",
                AUDIT_TARGET_TYPE,
                existing.id,
                &existing.ip_address,
                Some("Deleted IP asset.".to_string()),
            )
            .await?;
        Ok(true)
    }

    /// Listing used by the bundle export: resolved names plus tag sets.
    pub async fn list_for_export(
        &self,
        include_archived: bool,
    ) -> InventoryResult<Vec<IpAssetExportRow>> {
        let mut query = ip_assets::Entity::find().order_by_asc(ip_assets::Column::IpAddress);
        if !include_archived {
            query = query.filter(ip_assets::Column::Archived.eq(false));
        }
        let assets = query.all(self.db.as_ref()).await?;

        let project_names: std::collections::HashMap<i32, String> = projects::Entity::find()
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        let host_names: std::collections::HashMap<i32, String> = hosts::Entity::find()
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|h| (h.id, h.name))
            .collect();
        let asset_ids: Vec<i32> = assets.iter().map(|a| a.id).collect();
        let mut tag_map = self.tags.list_tags_for_ip_assets(&asset_ids).await?;

        Ok(assets
            .into_iter()
            .map(|asset| IpAssetExportRow {
                ip_address: asset.ip_address,
                asset_type: asset.asset_type,
                project_name: asset.project_id.and_then(|id| project_names.get(&id).cloned()),
                host_name: asset.host_id.and_then(|id| host_names.get(&id).cloned()),
                notes: asset.notes,
                archived: asset.archived,
                created_at: asset.created_at,
                updated_at: asset.updated_at,
                tags: tag_map.remove(&asset.id).unwrap_or_default(),
            })
            .collect())
    }

    async fn project_label(&self, project_id: Option<i32>) -> InventoryResult<String> {
        let Some(project_id) = project_id else {
            return Ok("Unassigned".to_string());
        };
        let project = projects::Entity::find_by_id(project_id)
            .one(self.db.as_ref())
            .await?;
        Ok(project
            .map(|p| p.name)
            .unwrap_or_else(|| format!("Unknown ({project_id})")))
    }

    async fn host_label(&self, host_id: Option<i32>) -> InventoryResult<String> {
        let Some(host_id) = host_id else {
            return Ok("Unassigned".to_string());
        };
        let host = hosts::Entity::find_by_id(host_id)
            .one(self.db.as_ref())
            .await?;
        Ok(host
            .map(|h| h.name)
            .unwrap_or_else(|| format!("Unknown ({host_id})")))
    }

    async fn summarize_changes(
        &self,
        existing: &ip_assets::Model,
        updated: &ip_assets::Model,
        tags_before: Option<&[String]>,
        tags_after: Option<&[String]>,
    ) -> InventoryResult<String> {
        let mut changes: Vec<String> = Vec::new();
        if existing.asset_type != updated.asset_type {
            changes.push(format!(
                "type: {} -> {}",
                existing.asset_type, updated.asset_type
            ));
        }
        if existing.project_id != updated.project_id {
            changes.push(format!(
                "project: {} -> {}",
                self.project_label(existing.project_id).await?,
                self.project_label(updated.project_id).await?
            ));
        }
        if existing.host_id != updated.host_id {
            changes.push(format!(
                "host: {} -> {}",
                self.host_label(existing.host_id).await?,
                self.host_label(updated.host_id).await?
            ));
        }
        if existing.notes.as_deref().unwrap_or("") != updated.notes.as_deref().unwrap_or("") {
            changes.push(format!(
                "notes: {} -> {}",
                existing.notes.as_deref().unwrap_or(""),
                updated.notes.as_deref().unwrap_or("")
            ));
        }
        if let (Some(before), Some(after)) = (tags_before, tags_after) {
            if before != after {
                let before_label = if before.is_empty() {
                    "none".to_string()
                } else {
                    before.join(", ")
                };
                let after_label = if after.is_empty() {
                    "none".to_string()
                } else {
                    after.join(", ")
                };
                changes.push(format!("tags: {before_label} -> {after_label}"));
            }
        }
        if changes.is_empty() {
            Ok("No changes recorded.".to_string())
        } else {
            Ok(changes.join("; "))
        }
    }
}
