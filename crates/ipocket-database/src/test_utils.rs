//! Test utilities for database integration tests
//!
//! Provides a migrated in-memory SQLite database so service and pipeline
//! tests run without external infrastructure.

use crate::DbConnection;
use ipocket_migrations::Migrator;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

/// In-memory test database with the full schema applied
pub struct TestDatabase {
    pub db: Arc<DbConnection>,
}

impl TestDatabase {
    /// Create a fresh, fully migrated in-memory database.
    ///
    /// The pool is pinned to a single connection: every pooled connection
    /// to `sqlite::memory:` would otherwise see its own empty database.
    pub async fn new() -> anyhow::Result<Self> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).sqlx_logging(false);

        let db = Database::connect(opt).await?;
        Migrator::up(&db, None).await?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get the database connection
    pub fn connection(&self) -> &DbConnection {
        &self.db
    }

    /// Get the database connection as Arc
    pub fn connection_arc(&self) -> Arc<DbConnection> {
        Arc::clone(&self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

    #[tokio::test]
    async fn test_database_setup_applies_schema() -> anyhow::Result<()> {
        let test_db = TestDatabase::new().await?;

        let result = test_db
            .connection()
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type = 'table'".to_owned(),
            ))
            .await?;

        let tables: Vec<String> = result
            .iter()
            .filter_map(|row| row.try_get::<String>("", "name").ok())
            .collect();
        for expected in ["vendors", "projects", "hosts", "ip_assets", "audit_logs"] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}");
        }

        Ok(())
    }
}
