use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::debug;

use ipocket_database::DbConnection;
use ipocket_entities::{hosts, ip_assets};

use super::types::InventoryResult;

/// CRUD over physical and virtual hosts
#[derive(Clone)]
pub struct HostService {
    db: Arc<DbConnection>,
}

impl HostService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        name: &str,
        notes: Option<String>,
        vendor_id: Option<i32>,
    ) -> InventoryResult<hosts::Model> {
        let host = hosts::ActiveModel {
            name: Set(name.to_string()),
            notes: Set(notes),
            vendor_id: Set(vendor_id),
            ..Default::default()
        };
        let created = host.insert(self.db.as_ref()).await?;
        debug!("Created host '{}'", created.name);
        Ok(created)
    }

    /// Update a host; fields left as `None` keep their stored value.
    pub async fn update(
        &self,
        host_id: i32,
        name: Option<String>,
        notes: Option<String>,
        vendor_id: Option<i32>,
    ) -> InventoryResult<Option<hosts::Model>> {
        let Some(existing) = hosts::Entity::find_by_id(host_id)
            .one(self.db.as_ref())
            .await?
        else {
            return Ok(None);
        };

        let mut active: hosts::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(notes) = notes {
            active.notes = Set(Some(notes));
        }
        if let Some(vendor_id) = vendor_id {
            active.vendor_id = Set(Some(vendor_id));
        }
        Ok(Some(active.update(self.db.as_ref()).await?))
    }

    pub async fn list(&self) -> InventoryResult<Vec<hosts::Model>> {
        Ok(hosts::Entity::find()
            .order_by_asc(hosts::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn get_by_name(&self, name: &str) -> InventoryResult<Option<hosts::Model>> {
        Ok(hosts::Entity::find()
            .filter(hosts::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await?)
    }

    /// Delete a host, detaching its IP assets first.
    pub async fn delete(&self, host_id: i32) -> InventoryResult<bool> {
        ip_assets::Entity::update_many()
            .col_expr(
                ip_assets::Column::HostId,
                sea_orm::sea_query::Expr::value(Option::<i32>::None),
            )
            .filter(ip_assets::Column::HostId.eq(host_id))
            .exec(self.db.as_ref())
            .await?;
        let result = hosts::Entity::delete_by_id(host_id)
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }
}
