//! Database connection management

use ipocket_core::{ServiceError, ServiceResult};
use ipocket_migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use tracing::info;

pub type DbConnection = DatabaseConnection;

/// Connect to the given database URL and bring the schema up to date.
///
/// Accepts any URL sea-orm understands; in practice `sqlite://ipocket.db`
/// for the single-node deployment and `postgresql://...` for shared ones.
pub async fn establish_connection(database_url: &str) -> ServiceResult<Arc<DbConnection>> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(10).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;

    // Run migrations
    Migrator::up(&db, None)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;

    info!("Database ready at {}", database_url);
    Ok(Arc::new(db))
}
