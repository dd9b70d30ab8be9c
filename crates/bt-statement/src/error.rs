//! Error types for bt-statement

use thiserror::Error;

/// Errors that can occur while parsing or signing statements
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structural validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Claims parsing or handler lookup error
    #[error("Artifact error: {0}")]
    Artifact(#[from] bt_artifact::Error),

    /// Key or signature error
    #[error("Crypto error: {0}")]
    Crypto(#[from] bt_crypto::Error),

    /// Hex decoding error
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// No statement signature verified under the given key
    #[error("No valid signature for the given public key")]
    SignatureInvalid,
}

/// Result type for statement operations
pub type Result<T> = std::result::Result<T, Error>;
