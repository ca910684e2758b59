use async_trait::async_trait;
use ipocket_core::UtcDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DbErr};
use serde::{Deserialize, Serialize};

use super::asset_type::IpAssetType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ip_assets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Canonical string form, unique across the inventory
    pub ip_address: String,
    #[sea_orm(column_name = "type")]
    pub asset_type: IpAssetType,
    pub project_id: Option<i32>,
    pub host_id: Option<i32>,
    pub notes: Option<String>,
    /// Archived assets stay addressable for audit history but drop out of
    /// active listings and exports
    pub archived: bool,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::hosts::Entity",
        from = "Column::HostId",
        to = "super::hosts::Column::Id"
    )]
    Host,
    #[sea_orm(has_many = "super::ip_asset_tags::Entity")]
    IpAssetTags,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::hosts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Host.def()
    }
}

impl Related<super::ip_asset_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IpAssetTags.def()
    }
}

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        super::ip_asset_tags::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::ip_asset_tags::Relation::IpAsset.def().rev())
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = chrono::Utc::now();

        if insert {
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
            if self.updated_at.is_not_set() {
                self.updated_at = Set(now);
            }
        } else {
            self.updated_at = Set(now);
        }

        Ok(self)
    }
}
