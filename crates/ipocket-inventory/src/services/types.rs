use sea_orm::DbErr;
use thiserror::Error;

/// Errors surfaced by the inventory services
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type InventoryResult<T> = Result<T, InventoryError>;
