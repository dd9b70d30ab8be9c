//! Error types for bt-policy

use bt_artifact::CategoryId;
use thiserror::Error;

/// Errors that can occur while parsing or checking policies
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Handler lookup or requirement/claim error
    #[error("Artifact error: {0}")]
    Artifact(#[from] bt_artifact::Error),

    /// Statement encoding error
    #[error("Statement error: {0}")]
    Statement(#[from] bt_statement::Error),

    /// Key parsing or signature error
    #[error("Crypto error: {0}")]
    Crypto(#[from] bt_crypto::Error),

    /// Hex decoding error
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// The statement carries no artifact of a category the entry requires
    #[error("The boot bundle does not include an artifact of required category {0:#06x}")]
    MissingCategory(CategoryId),

    /// Fewer distinct valid signers than the required quorum
    #[error("Insufficient number of valid signatures ({valid}), policy quorum of {quorum} not reached")]
    QuorumUnsatisfied { valid: u64, quorum: u64 },

    /// No policy entry accepted the bundle
    #[error("No policy entry authorizes the boot bundle")]
    PolicyUnsatisfied,
}

/// Result type for policy operations
pub type Result<T> = std::result::Result<T, Error>;
