//! Error types for bt-merkle

use thiserror::Error;

/// Errors that can occur in Merkle tree operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid proof shape (size, index, or path length)
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    /// The computed root does not match the expected root
    #[error("Root mismatch: expected {expected}, computed {computed}")]
    RootMismatch { expected: String, computed: String },
}

/// Result type for Merkle tree operations
pub type Result<T> = std::result::Result<T, Error>;
