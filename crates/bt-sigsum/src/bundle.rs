//! Sigsum proof bundle

use crate::probe::Probe;
use bt_transparency::{statement_bytes, EngineId, Result};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Sigsum view of a proof bundle
///
/// The inclusion proof is carried as one string holding the ASCII proof
/// document.
#[derive(Debug, Serialize, Deserialize)]
pub struct SigsumBundle {
    /// Engine format identifier
    pub format: EngineId,

    /// Serialized JSON of the logged statement, byte-exact
    pub statement: Box<RawValue>,

    /// Probe data used to request a fresh proof
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe: Option<Probe>,

    /// ASCII proof document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,
}

impl SigsumBundle {
    /// The logged pre-image bytes, exactly as submitted to the log
    pub fn statement_bytes(&self) -> Result<Vec<u8>> {
        statement_bytes(&self.statement)
    }
}
