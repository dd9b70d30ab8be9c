//! Tessera proof bundle

use crate::probe::Probe;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bt_transparency::{statement_bytes, EngineId, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Tessera view of a proof bundle
///
/// The inclusion proof is an array of base64 strings, one 32-byte node hash
/// each. The bundle also carries the signed checkpoint the proof was built
/// under; offline verification refuses to run without it.
#[derive(Debug, Serialize, Deserialize)]
pub struct TesseraBundle {
    /// Engine format identifier
    pub format: EngineId,

    /// Serialized JSON of the logged statement, byte-exact
    pub statement: Box<RawValue>,

    /// Probe data used to request a fresh proof
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe: Option<Probe>,

    /// Inclusion proof node hashes, base64-encoded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proof: Vec<String>,

    /// The signed checkpoint (note text) committing to the probe's root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<String>,
}

impl TesseraBundle {
    /// The logged pre-image bytes, exactly as submitted to the log
    pub fn statement_bytes(&self) -> Result<Vec<u8>> {
        statement_bytes(&self.statement)
    }

    /// Decode the inclusion proof entries
    ///
    /// Every entry must be valid base64 of exactly 32 bytes.
    pub fn decoded_proof(&self) -> Result<Vec<[u8; 32]>> {
        let mut nodes = Vec::with_capacity(self.proof.len());

        for entry in &self.proof {
            let decoded = STANDARD.decode(entry).map_err(|e| {
                Error::Parse(format!("unable to parse inclusion proof: {}", e))
            })?;

            let node: [u8; 32] = decoded.try_into().map_err(|_| {
                Error::Parse(format!(
                    "unable to parse inclusion proof, invalid base64 entry: {}",
                    entry
                ))
            })?;

            nodes.push(node);
        }

        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(proof_entries: &str) -> TesseraBundle {
        let json = format!(
            r#"{{"format": 2, "statement": {{"artifacts": []}}, "proof": [{}]}}"#,
            proof_entries
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_decoded_proof() {
        let b = bundle(r#""uzTMCXORU4P578THD4xrb5W3TMYwRE+oMYLihfiU6QA=""#);
        let nodes = b.decoded_proof().unwrap();

        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_decoded_proof_rejects_bad_base64() {
        let b = bundle(r#""not!!!base64***""#);
        assert!(matches!(b.decoded_proof(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_decoded_proof_rejects_short_entry() {
        // valid base64, wrong decoded length
        let b = bundle(r#""uzTM""#);
        assert!(matches!(b.decoded_proof(), Err(Error::Parse(_))));
    }
}
