use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::debug;

use ipocket_database::DbConnection;
use ipocket_entities::{hosts, vendors};

use super::types::InventoryResult;

/// CRUD over hardware vendors
#[derive(Clone)]
pub struct VendorService {
    db: Arc<DbConnection>,
}

impl VendorService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, name: &str) -> InventoryResult<vendors::Model> {
        let vendor = vendors::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };
        let created = vendor.insert(self.db.as_ref()).await?;
        debug!("Created vendor '{}'", created.name);
        Ok(created)
    }

    pub async fn list(&self) -> InventoryResult<Vec<vendors::Model>> {
        Ok(vendors::Entity::find()
            .order_by_asc(vendors::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn get_by_name(&self, name: &str) -> InventoryResult<Option<vendors::Model>> {
        Ok(vendors::Entity::find()
            .filter(vendors::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await?)
    }

    /// Delete a vendor, detaching its hosts first.
    pub async fn delete(&self, vendor_id: i32) -> InventoryResult<bool> {
        hosts::Entity::update_many()
            .col_expr(hosts::Column::VendorId, sea_orm::sea_query::Expr::value(Option::<i32>::None))
            .filter(hosts::Column::VendorId.eq(vendor_id))
            .exec(self.db.as_ref())
            .await?;
        let result = vendors::Entity::delete_by_id(vendor_id)
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipocket_database::test_utils::TestDatabase;

    #[tokio::test]
    async fn test_create_and_list_vendors_sorted_by_name() -> anyhow::Result<()> {
        let test_db = TestDatabase::new().await?;
        let service = VendorService::new(test_db.connection_arc());

        service.create("Supermicro").await?;
        service.create("Dell").await?;

        let vendors = service.list().await?;
        let names: Vec<&str> = vendors.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Dell", "Supermicro"]);

        assert!(service.get_by_name("Dell").await?.is_some());
        assert!(service.get_by_name("HPE").await?.is_none());
        Ok(())
    }
}
