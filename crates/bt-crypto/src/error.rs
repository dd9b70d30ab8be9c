//! Error types for bt-crypto

use thiserror::Error;

/// Errors that can occur in cryptographic operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or unsupported key material
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Signature verification failed
    #[error("Verification error: {0}")]
    Verification(String),

    /// Malformed checkpoint or note
    #[error("Invalid checkpoint: {0}")]
    Checkpoint(String),

    /// Base64 decoding error
    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Hex decoding error
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, Error>;
