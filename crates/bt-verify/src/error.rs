//! Error types for bt-verify

use thiserror::Error;

/// Errors that can occur during bundle verification
#[derive(Error, Debug)]
pub enum Error {
    /// Transparency layer error
    #[error("Transparency error: {0}")]
    Transparency(#[from] bt_transparency::Error),

    /// Statement error
    #[error("Statement error: {0}")]
    Statement(#[from] bt_statement::Error),

    /// Policy error
    #[error("Policy error: {0}")]
    Policy(#[from] bt_policy::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for verification operations
pub type Result<T> = std::result::Result<T, Error>;
