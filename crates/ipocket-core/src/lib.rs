//! Core utilities and types shared across all ipocket crates

pub mod error;
pub mod types;
pub mod validation;
mod constants;

// Re-export commonly used types
pub use constants::*;
pub use error::*;
pub use types::*;
pub use validation::*;

// Re-export external dependencies
pub use anyhow;
pub use chrono;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tracing;
