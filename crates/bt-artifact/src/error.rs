//! Error types for bt-artifact

use crate::CategoryId;
use thiserror::Error;

/// Errors that can occur while parsing or matching artifact data
#[derive(Error, Debug)]
pub enum Error {
    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed requirement or claim value (bad hex, semver, timestamp, ...)
    #[error("Parse error: {0}")]
    Parse(String),

    /// No handler registered for the category
    #[error("No handler registered for artifact category {0:#06x}")]
    UnknownCategory(CategoryId),

    /// A claim does not satisfy a policy requirement
    #[error("Requirement not met: {0}")]
    RequirementUnmet(String),

    /// Requirements or claims of the wrong concrete type reached a handler
    #[error("Invalid handler input: {0}")]
    InvalidInput(String),
}

/// Result type for artifact operations
pub type Result<T> = std::result::Result<T, Error>;
