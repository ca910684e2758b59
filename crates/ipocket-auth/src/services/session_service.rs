use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, ModelTrait, Set};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use ipocket_database::DbConnection;
use ipocket_entities::sessions;

/// Database-backed session store
pub struct SessionService {
    db: Arc<DbConnection>,
}

impl SessionService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    /// Create a session for a user and return its token.
    pub async fn create(&self, user_id: i32) -> Result<String, DbErr> {
        let token = Uuid::new_v4().simple().to_string();
        let session = sessions::ActiveModel {
            token: Set(token.clone()),
            user_id: Set(user_id),
            ..Default::default()
        };
        session.insert(self.db.as_ref()).await?;
        debug!("Created session for user {}", user_id);
        Ok(token)
    }

    /// Resolve a token to its user id, if the session exists.
    pub async fn lookup(&self, token: &str) -> Result<Option<i32>, DbErr> {
        let session = sessions::Entity::find_by_id(token.to_string())
            .one(self.db.as_ref())
            .await?;
        Ok(session.map(|s| s.user_id))
    }

    /// Delete a session. Returns whether a session was removed.
    pub async fn revoke(&self, token: &str) -> Result<bool, DbErr> {
        let session = sessions::Entity::find_by_id(token.to_string())
            .one(self.db.as_ref())
            .await?;
        match session {
            Some(session) => {
                session.delete(self.db.as_ref()).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop every session, e.g. on credential rotation.
    pub async fn clear(&self) -> Result<(), DbErr> {
        sessions::Entity::delete_many()
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipocket_database::test_utils::TestDatabase;
    use ipocket_entities::{users, UserRole};

    async fn seed_user(db: &DbConnection) -> anyhow::Result<users::Model> {
        let user = users::ActiveModel {
            username: Set("admin".to_string()),
            hashed_password: Set("argon2-hash".to_string()),
            role: Set(UserRole::Admin),
            is_active: Set(true),
            ..Default::default()
        };
        Ok(user.insert(db).await?)
    }

    #[tokio::test]
    async fn test_session_lifecycle() -> anyhow::Result<()> {
        let test_db = TestDatabase::new().await?;
        let user = seed_user(test_db.connection()).await?;
        let service = SessionService::new(test_db.connection_arc());

        let token = service.create(user.id).await?;
        assert_eq!(service.lookup(&token).await?, Some(user.id));
        assert_eq!(service.lookup("missing-token").await?, None);

        assert!(service.revoke(&token).await?);
        assert!(!service.revoke(&token).await?);
        assert_eq!(service.lookup(&token).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_clear_removes_all_sessions() -> anyhow::Result<()> {
        let test_db = TestDatabase::new().await?;
        let user = seed_user(test_db.connection()).await?;
        let service = SessionService::new(test_db.connection_arc());

        let first = service.create(user.id).await?;
        let second = service.create(user.id).await?;
        service.clear().await?;

        assert_eq!(service.lookup(&first).await?, None);
        assert_eq!(service.lookup(&second).await?, None);
        Ok(())
    }
}
