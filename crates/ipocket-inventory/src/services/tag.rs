use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use std::sync::Arc;

use ipocket_core::{normalize_hex_color, normalize_tag_names, DEFAULT_TAG_COLOR};
use ipocket_database::DbConnection;
use ipocket_entities::{ip_asset_tags, tags};

use super::types::{InventoryError, InventoryResult};

/// Tag management and the IP-asset/tag relation
#[derive(Clone)]
pub struct TagService {
    db: Arc<DbConnection>,
}

impl TagService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, name: &str, color: Option<&str>) -> InventoryResult<tags::Model> {
        let normalized_color = match color {
            Some(value) => normalize_hex_color(value)
                .map_err(|e| InventoryError::InvalidInput(e.to_string()))?,
            None => None,
        };
        let tag = tags::ActiveModel {
            name: Set(name.to_string()),
            color: Set(normalized_color.unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string())),
            ..Default::default()
        };
        Ok(tag.insert(self.db.as_ref()).await?)
    }

    pub async fn list(&self) -> InventoryResult<Vec<tags::Model>> {
        Ok(tags::Entity::find()
            .order_by_asc(tags::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    /// Tag names per asset id, sorted by name. Assets without tags map to
    /// an empty list.
    pub async fn list_tags_for_ip_assets(
        &self,
        asset_ids: &[i32],
    ) -> InventoryResult<HashMap<i32, Vec<String>>> {
        let mut mapping: HashMap<i32, Vec<String>> =
            asset_ids.iter().map(|id| (*id, Vec::new())).collect();
        if asset_ids.is_empty() {
            return Ok(mapping);
        }

        let rows = ip_asset_tags::Entity::find()
            .filter(ip_asset_tags::Column::IpAssetId.is_in(asset_ids.to_vec()))
            .find_also_related(tags::Entity)
            .all(self.db.as_ref())
            .await?;

        for (link, tag) in rows {
            if let Some(tag) = tag {
                mapping.entry(link.ip_asset_id).or_default().push(tag.name);
            }
        }
        for names in mapping.values_mut() {
            names.sort();
        }
        Ok(mapping)
    }

    /// Replace an asset's tag set with the given names, creating missing
    /// tags on the fly. Returns the normalized names that were linked.
    pub async fn set_ip_asset_tags(
        &self,
        asset_id: i32,
        tag_names: &[String],
    ) -> InventoryResult<Vec<String>> {
        let normalized = normalize_tag_names(tag_names);

        ip_asset_tags::Entity::delete_many()
            .filter(ip_asset_tags::Column::IpAssetId.eq(asset_id))
            .exec(self.db.as_ref())
            .await?;

        for name in &normalized {
            let tag = match tags::Entity::find()
                .filter(tags::Column::Name.eq(name.clone()))
                .one(self.db.as_ref())
                .await?
            {
                Some(tag) => tag,
                None => {
                    let tag = tags::ActiveModel {
                        name: Set(name.clone()),
                        color: Set(DEFAULT_TAG_COLOR.to_string()),
                        ..Default::default()
                    };
                    tag.insert(self.db.as_ref()).await?
                }
            };
            let link = ip_asset_tags::ActiveModel {
                ip_asset_id: Set(asset_id),
                tag_id: Set(tag.id),
            };
            link.insert(self.db.as_ref()).await?;
        }

        Ok(normalized)
    }
}
