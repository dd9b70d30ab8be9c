//! Error taxonomy shared by the transparency engines

use crate::EngineId;
use thiserror::Error;

/// Errors that can occur in the transparency layer
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed proof bundle, probe, proof or witness policy
    #[error("Parse error: {0}")]
    Parse(String),

    /// No engine registered for the format identifier
    #[error("No transparency engine registered for format {0}")]
    UnknownEngine(EngineId),

    /// The bundle's format does not match the engine it was handed to
    #[error("Invalid bundle format {found}, expected {expected}")]
    EngineMismatch { found: EngineId, expected: EngineId },

    /// No trusted log public key is configured
    #[error("Log public key is not set")]
    NoTrustedLogKey,

    /// No trusted submit public key is configured
    #[error("Submit public key is not set")]
    NoTrustedSubmitKey,

    /// Cosignatures do not satisfy the configured witness policy
    #[error("Witness policy unsatisfied: {0}")]
    WitnessPolicyUnsatisfied(String),

    /// Signature or inclusion proof verification failed
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Transport or timeout failure while talking to the log
    #[error("Network error: {0}")]
    Network(String),

    /// Missing or inconsistent engine configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for transparency operations
pub type Result<T> = std::result::Result<T, Error>;
