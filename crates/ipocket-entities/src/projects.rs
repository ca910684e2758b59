use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Hex color shown as the project badge in listings
    pub color: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ip_assets::Entity")]
    IpAssets,
}

impl Related<super::ip_assets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IpAssets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
