use async_trait::async_trait;
use ipocket_core::UtcDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DbErr};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Normalized lowercase tag name
    pub name: String,
    pub color: String,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ip_asset_tags::Entity")]
    IpAssetTags,
}

impl Related<super::ip_asset_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IpAssetTags.def()
    }
}

impl Related<super::ip_assets::Entity> for Entity {
    fn to() -> RelationDef {
        super::ip_asset_tags::Relation::IpAsset.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::ip_asset_tags::Relation::Tag.def().rev())
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
