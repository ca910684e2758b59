//! Connector error type

use thiserror::Error;

/// Errors shared by every connector
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Transport-level failure talking to the external API
    #[error("Failed to call external API: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("{service} request failed with HTTP {status}: {details}")]
    Api {
        service: &'static str,
        status: u16,
        details: String,
    },

    /// The API answered 200 but the payload was not usable
    #[error("{0}")]
    InvalidPayload(String),

    /// Bad connector configuration (URL, auth, labels)
    #[error("{0}")]
    InvalidConfig(String),

    #[error("Failed to write bundle: {0}")]
    Io(#[from] std::io::Error),
}
