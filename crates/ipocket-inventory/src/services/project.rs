use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::debug;

use ipocket_core::DEFAULT_PROJECT_COLOR;
use ipocket_database::DbConnection;
use ipocket_entities::{ip_assets, projects};

use super::types::InventoryResult;

/// CRUD over projects
#[derive(Clone)]
pub struct ProjectService {
    db: Arc<DbConnection>,
}

impl ProjectService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<String>,
        color: Option<String>,
    ) -> InventoryResult<projects::Model> {
        let project = projects::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description),
            color: Set(color.unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string())),
            ..Default::default()
        };
        let created = project.insert(self.db.as_ref()).await?;
        debug!("Created project '{}'", created.name);
        Ok(created)
    }

    /// Update a project; fields left as `None` keep their stored value.
    pub async fn update(
        &self,
        project_id: i32,
        name: Option<String>,
        description: Option<String>,
        color: Option<String>,
    ) -> InventoryResult<Option<projects::Model>> {
        let Some(existing) = projects::Entity::find_by_id(project_id)
            .one(self.db.as_ref())
            .await?
        else {
            return Ok(None);
        };

        let mut active: projects::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        if let Some(color) = color {
            active.color = Set(color);
        }
        Ok(Some(active.update(self.db.as_ref()).await?))
    }

    pub async fn list(&self) -> InventoryResult<Vec<projects::Model>> {
        Ok(projects::Entity::find()
            .order_by_asc(projects::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn get_by_id(&self, project_id: i32) -> InventoryResult<Option<projects::Model>> {
        Ok(projects::Entity::find_by_id(project_id)
            .one(self.db.as_ref())
            .await?)
    }

    pub async fn get_by_name(&self, name: &str) -> InventoryResult<Option<projects::Model>> {
        Ok(projects::Entity::find()
            .filter(projects::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await?)
    }

    /// Delete a project, detaching its IP assets first.
    pub async fn delete(&self, project_id: i32) -> InventoryResult<bool> {
        ip_assets::Entity::update_many()
            .col_expr(
                ip_assets::Column::ProjectId,
                sea_orm::sea_query::Expr::value(Option::<i32>::None),
            )
            .filter(ip_assets::Column::ProjectId.eq(project_id))
            .exec(self.db.as_ref())
            .await?;
        let result = projects::Entity::delete_by_id(project_id)
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }
}
