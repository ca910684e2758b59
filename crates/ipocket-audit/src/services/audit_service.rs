use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;

use ipocket_database::DbConnection;
use ipocket_entities::{audit_logs, users};

/// Records and queries the audit trail
pub struct AuditService {
    db: Arc<DbConnection>,
}

impl AuditService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    /// Write one audit row. `user` is the acting account, if any; the
    /// username is denormalized into the row so it survives user deletion.
    pub async fn create_audit_log(
        &self,
        user: Option<&users::Model>,
        action: &str,
        target_type: &str,
        target_id: i32,
        target_label: &str,
        changes: Option<String>,
    ) -> Result<audit_logs::Model, DbErr> {
        let entry = audit_logs::ActiveModel {
            user_id: Set(user.map(|u| u.id)),
            username: Set(user.map(|u| u.username.clone())),
            target_type: Set(target_type.to_string()),
            target_id: Set(target_id),
            target_label: Set(target_label.to_string()),
            action: Set(action.to_string()),
            changes: Set(changes),
            ..Default::default()
        };

        entry.insert(self.db.as_ref()).await
    }

    /// Audit timeline of one record, newest first.
    pub async fn list_for_target(
        &self,
        target_type: &str,
        target_id: i32,
    ) -> Result<Vec<audit_logs::Model>, DbErr> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::TargetType.eq(target_type))
            .filter(audit_logs::Column::TargetId.eq(target_id))
            .order_by_desc(audit_logs::Column::CreatedAt)
            .order_by_desc(audit_logs::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    /// Recent audit rows for a target type, newest first.
    pub async fn list_paginated(
        &self,
        target_type: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<audit_logs::Model>, DbErr> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::TargetType.eq(target_type))
            .order_by_desc(audit_logs::Column::CreatedAt)
            .order_by_desc(audit_logs::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
    }

    pub async fn count(&self, target_type: &str) -> Result<u64, DbErr> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::TargetType.eq(target_type))
            .count(self.db.as_ref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipocket_database::test_utils::TestDatabase;

    #[tokio::test]
    async fn test_create_and_list_audit_logs() -> anyhow::Result<()> {
        let test_db = TestDatabase::new().await?;
        let service = AuditService::new(test_db.connection_arc());

        service
            .create_audit_log(
                None,
                "CREATE",
                "IP_ASSET",
                7,
                "10.0.0.5",
                Some("Created IP asset (type=OS)".to_string()),
            )
            .await?;
        service
            .create_audit_log(None, "UPDATE", "IP_ASSET", 7, "10.0.0.5", None)
            .await?;
        service
            .create_audit_log(None, "APPLY", "IMPORT_RUN", 0, "bundle", None)
            .await?;

        let timeline = service.list_for_target("IP_ASSET", 7).await?;
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].action, "UPDATE");

        assert_eq!(service.count("IP_ASSET").await?, 2);
        assert_eq!(service.count("IMPORT_RUN").await?, 1);

        let page = service.list_paginated("IP_ASSET", 1, 0).await?;
        assert_eq!(page.len(), 1);

        Ok(())
    }
}
