//! Proof bundle envelope

use crate::error::{Error, Result};
use crate::EngineId;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// The engine-agnostic view of a proof bundle
///
/// Only the `format` field is interpreted here; statement, probe and proof
/// are kept verbatim and handed to the engine selected by `format`, which
/// re-parses the bundle into its own typed shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProofBundle {
    /// Engine format identifier (1: Sigsum, 2: Tessera)
    pub format: EngineId,

    /// Serialized JSON of the logged statement, byte-exact
    pub statement: Box<RawValue>,

    /// Engine-specific probe data used to request a fresh proof
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe: Option<Box<RawValue>>,

    /// Engine-specific serialized proof
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Box<RawValue>>,
}

impl ProofBundle {
    /// Parse only the envelope of a serialized proof bundle
    pub fn parse(json: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(json)?)
    }
}

/// Recover the logged pre-image bytes from a bundle's `statement` field
///
/// The statement is carried either as raw JSON (the exact logged bytes) or
/// as a JSON-escaped string wrapping them; both forms are accepted and the
/// raw bytes are returned without re-serialization.
pub fn statement_bytes(raw: &RawValue) -> Result<Vec<u8>> {
    let text = raw.get();

    if text.trim_start().starts_with('"') {
        let unescaped: String = serde_json::from_str(text)?;
        return Ok(unescaped.into_bytes());
    }

    Ok(text.as_bytes().to_vec())
}
