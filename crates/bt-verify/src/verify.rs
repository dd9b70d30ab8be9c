//! The verification pipeline

use crate::error::Result;
use bt_artifact::Registry;
use bt_policy::Policy;
use bt_sigsum::SigsumEngine;
use bt_statement::Statement;
use bt_tessera::TesseraEngine;
use bt_transparency::{statement_bytes, EngineRegistry, ProofBundle};

/// Trust material for one verification
///
/// The keys and the witness policy are installed into the engine selected
/// by the bundle's format; they are replaced wholesale on every check and
/// never mutated during one.
#[derive(Debug, Clone, Default)]
pub struct TrustConfig {
    /// Trusted log public keys
    pub log_keys: Vec<String>,

    /// Trusted submit public keys
    pub submit_keys: Vec<String>,

    /// Witness policy in the engine's text format, if cosignatures are
    /// required
    pub witness_policy: Option<Vec<u8>>,
}

/// The boot-bundle verifier
///
/// Owns the artifact handler and transparency engine registries, both
/// populated at construction and read-only afterwards.
pub struct Verifier {
    engines: EngineRegistry,
    registry: Registry,
    online: bool,
}

impl Verifier {
    /// Create a verifier with the built-in engines and category handlers
    ///
    /// `online` enables refreshing the inclusion proof from the origin log
    /// before verification; offline verifiers only check the proof carried
    /// by the bundle.
    pub fn new(online: bool) -> Self {
        let mut engines = EngineRegistry::new();
        engines
            .register(Box::new(SigsumEngine::new(online)))
            .expect("engine formats are distinct");
        engines
            .register(Box::new(TesseraEngine::new()))
            .expect("engine formats are distinct");

        Self {
            engines,
            registry: Registry::with_builtin(),
            online,
        }
    }

    /// The artifact handler registry used for statement and policy parsing
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Check a proof bundle against a boot policy
    ///
    /// Fail-closed: any error rejects the bundle. On success the parsed
    /// statement is returned.
    ///
    /// The pipeline: select the engine by the bundle's format, install the
    /// trust material, verify log inclusion (optionally refreshing the
    /// proof online), then parse the statement and check the policy.
    pub async fn check_bundle(
        &mut self,
        bundle: &[u8],
        policy: &[u8],
        trust: &TrustConfig,
    ) -> Result<Statement> {
        let envelope = ProofBundle::parse(bundle)?;
        let online = self.online;

        let engine = self.engines.engine_mut(envelope.format)?;
        engine.set_keys(&trust.log_keys, &trust.submit_keys)?;

        match &trust.witness_policy {
            Some(witness_policy) => {
                let parsed = engine.parse_witness_policy(witness_policy)?;
                engine.set_witness_policy(parsed)?;
            }
            None => engine.reset_witness_policy(),
        }

        let (mut view, _) = engine.parse_proof(bundle)?;

        if online {
            // probe the log for a fresh tree head and inclusion proof, and
            // re-assemble the bundle around it
            let proof = engine.get_proof(view.as_ref()).await?;
            let refreshed = embed_proof(bundle, &proof)?;

            tracing::debug!(format = envelope.format, "verifying refreshed proof");
            (view, _) = engine.parse_proof(&refreshed)?;
        }

        engine.verify_proof(view.as_ref())?;

        let statement = Statement::parse(&statement_bytes(&envelope.statement)?, &self.registry)?;

        let policy = Policy::parse(policy, &self.registry)?;
        bt_policy::check(&policy, &statement, &self.registry)?;

        Ok(statement)
    }
}

/// Replace the `proof` field of a serialized bundle
///
/// The statement and probe travel through untouched (the statement bytes
/// are the logged pre-image and must stay verbatim). The proof is
/// engine-specific: a JSON value (Tessera's node array) is embedded as-is,
/// anything else (Sigsum's ASCII document) as a JSON string.
fn embed_proof(bundle: &[u8], proof: &[u8]) -> Result<Vec<u8>> {
    use serde_json::value::RawValue;

    let mut envelope = ProofBundle::parse(bundle)?;

    let proof_raw: Box<RawValue> = match serde_json::from_slice::<Box<RawValue>>(proof) {
        Ok(value) => value,
        Err(_) => {
            let text = String::from_utf8_lossy(proof);
            RawValue::from_string(serde_json::to_string(text.as_ref())?)?
        }
    };

    envelope.proof = Some(proof_raw);
    Ok(serde_json::to_vec(&envelope)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_proof_json_array() {
        let bundle = br#"{"format": 2, "statement": {"a":  1}, "proof": []}"#;
        let refreshed = embed_proof(bundle, br#"["uzTM"]"#).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&refreshed).unwrap();
        assert_eq!(value["proof"][0], "uzTM");

        // the logged pre-image bytes survive untouched
        let envelope = ProofBundle::parse(&refreshed).unwrap();
        assert_eq!(envelope.statement.get(), r#"{"a":  1}"#);
    }

    #[test]
    fn test_embed_proof_ascii_text() {
        let bundle = br#"{"format": 1, "statement": {}}"#;
        let refreshed = embed_proof(bundle, b"version=2\nlog=aa\n").unwrap();

        let value: serde_json::Value = serde_json::from_slice(&refreshed).unwrap();
        assert_eq!(value["proof"], "version=2\nlog=aa\n");
    }
}
