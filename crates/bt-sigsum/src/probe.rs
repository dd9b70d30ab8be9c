//! Probe data for requesting a Sigsum inclusion proof

use serde::{Deserialize, Serialize};

/// The set of inputs required to probe a Sigsum log for the inclusion proof
/// of a given leaf
///
/// The leaf hash itself is not carried: it is recomputed from the statement
/// included in the proof bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Probe {
    /// Log origin URL
    pub origin: String,

    /// Leaf signature in hex format; Sigsum identifies the leaf by it
    pub leaf_signature: String,

    /// Log key hash in hex format, as found in Sigsum proof documents
    pub log_public_key_hash: String,

    /// Submitter key hash in hex format, as found in Sigsum proof documents
    pub submit_public_key_hash: String,
}
