//! Tessera engine implementation

use crate::bundle::TesseraBundle;
use crate::fetch::fetcher_for_origin;
use crate::tile::ProofBuilder;
use crate::witness::WitnessGroup;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bt_crypto::{NoteVerifier, SignedNote};
use bt_merkle::hash_leaf;
use bt_transparency::{EngineId, Error, Result, TransparencyEngine, TESSERA};
use std::any::Any;
use std::time::Duration;

/// Deadline shared by the checkpoint and tile fetches
const GET_PROOF_TIMEOUT: Duration = Duration::from_secs(30);

/// The Tessera transparency engine and its configuration
#[derive(Default)]
pub struct TesseraEngine {
    /// Trusted log keys in note verifier format
    log_keys: Vec<NoteVerifier>,

    witness_policy: Option<WitnessGroup>,
}

impl TesseraEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn downcast<'a>(&self, bundle: &'a (dyn Any + Send + Sync)) -> Result<&'a TesseraBundle> {
        let bundle = bundle
            .downcast_ref::<TesseraBundle>()
            .ok_or_else(|| Error::Parse("invalid proof bundle for the Tessera engine".to_string()))?;

        if bundle.format != TESSERA {
            return Err(Error::EngineMismatch {
                found: bundle.format,
                expected: TESSERA,
            });
        }

        Ok(bundle)
    }

    /// Verify the bundle's checkpoint under some trusted log key
    ///
    /// Returns the parsed note on success. The probe's root and tree size
    /// must match the checkpoint's commitment.
    fn verify_checkpoint(&self, bundle: &TesseraBundle, probe: &crate::Probe) -> Result<SignedNote> {
        let text = bundle.checkpoint.as_deref().ok_or_else(|| {
            Error::Config("offline verification requires a signed checkpoint in the bundle".to_string())
        })?;
        let note = SignedNote::from_text(text).map_err(|e| Error::Parse(e.to_string()))?;

        let mut verified = false;
        for verifier in &self.log_keys {
            if note.verify(verifier).is_ok() {
                verified = true;
                break;
            }
        }
        if !verified {
            return Err(Error::Crypto(
                "checkpoint is not signed by a trusted log key".to_string(),
            ));
        }

        if note.checkpoint.tree_size != probe.tree_size {
            return Err(Error::Crypto(format!(
                "checkpoint tree size {} does not match probe tree size {}",
                note.checkpoint.tree_size, probe.tree_size
            )));
        }
        if note.checkpoint.root_hash != probe.root {
            return Err(Error::Crypto(
                "checkpoint root does not match probe root".to_string(),
            ));
        }

        Ok(note)
    }
}

#[async_trait]
impl TransparencyEngine for TesseraEngine {
    fn engine_id(&self) -> EngineId {
        TESSERA
    }

    fn parse_proof(&self, bundle: &[u8]) -> Result<(Box<dyn Any + Send + Sync>, Vec<u8>)> {
        let bundle: TesseraBundle = serde_json::from_slice(bundle)?;

        if bundle.format != TESSERA {
            return Err(Error::EngineMismatch {
                found: bundle.format,
                expected: TESSERA,
            });
        }

        // the statement is not parsed here; validate the proof entries and
        // keep the rest verbatim
        bundle.decoded_proof()?;

        let normalized = serde_json::to_vec_pretty(&bundle)?;
        Ok((Box::new(bundle), normalized))
    }

    fn parse_witness_policy(&self, policy: &[u8]) -> Result<Box<dyn Any + Send + Sync>> {
        Ok(Box::new(WitnessGroup::parse(policy)?))
    }

    fn set_keys(&mut self, log_keys: &[String], _submit_keys: &[String]) -> Result<()> {
        // Tessera does not use the submit key during verification
        let mut parsed = Vec::with_capacity(log_keys.len());
        for key in log_keys {
            parsed.push(NoteVerifier::parse(key).map_err(|e| Error::Parse(e.to_string()))?);
        }

        self.log_keys = parsed;
        Ok(())
    }

    fn set_witness_policy(&mut self, policy: Box<dyn Any + Send + Sync>) -> Result<()> {
        let policy = policy
            .downcast::<WitnessGroup>()
            .map_err(|_| Error::Config("invalid witness policy for the Tessera engine".to_string()))?;

        self.witness_policy = Some(*policy);
        Ok(())
    }

    fn reset_witness_policy(&mut self) {
        self.witness_policy = None;
    }

    fn verify_proof(&self, bundle: &(dyn Any + Send + Sync)) -> Result<()> {
        let bundle = self.downcast(bundle)?;

        if self.log_keys.is_empty() {
            return Err(Error::NoTrustedLogKey);
        }

        let probe = bundle
            .probe
            .as_ref()
            .ok_or_else(|| Error::Config("no probe data in the bundle".to_string()))?;

        // the leaf commits to the statement pre-image verbatim
        let leaf_hash = hash_leaf(&bundle.statement_bytes()?);
        let proof = bundle.decoded_proof()?;

        // trust in the probe's root comes from the signed checkpoint, never
        // from the probe alone
        let note = self.verify_checkpoint(bundle, probe)?;

        if let Some(policy) = &self.witness_policy {
            policy.satisfied(&note)?;
        }

        bt_merkle::verify_inclusion_proof(
            &leaf_hash,
            probe.leaf_idx,
            note.checkpoint.tree_size,
            &proof,
            &note.checkpoint.root_hash,
        )
        .map_err(|e| Error::Crypto(format!("invalid inclusion proof: {}", e)))
    }

    async fn get_proof(&self, bundle: &(dyn Any + Send + Sync)) -> Result<Vec<u8>> {
        let bundle = self.downcast(bundle)?;

        let probe = bundle
            .probe
            .as_ref()
            .ok_or_else(|| Error::Config("no probe data in the bundle".to_string()))?;

        let witness_policy = self
            .witness_policy
            .as_ref()
            .ok_or_else(|| Error::Config("witness policy not configured".to_string()))?;

        if self.log_keys.is_empty() {
            return Err(Error::NoTrustedLogKey);
        }

        // the probe's key must be one of the trusted log keys
        let probe_key =
            NoteVerifier::parse(&probe.log_public_key).map_err(|e| Error::Parse(e.to_string()))?;
        let verifier = self
            .log_keys
            .iter()
            .find(|k| **k == probe_key)
            .ok_or_else(|| {
                Error::Config("probe log public key is not among the trusted keys".to_string())
            })?;

        let fetcher = fetcher_for_origin(&probe.origin)?;
        let leaf_hash = hash_leaf(&bundle.statement_bytes()?);

        let proof = tokio::time::timeout(GET_PROOF_TIMEOUT, async {
            let raw = fetcher.read_checkpoint().await?;
            let text = String::from_utf8(raw)
                .map_err(|_| Error::Parse("checkpoint is not valid UTF-8".to_string()))?;
            let note = SignedNote::from_text(&text).map_err(|e| Error::Parse(e.to_string()))?;

            note.verify(verifier)
                .map_err(|e| Error::Crypto(format!("invalid checkpoint signature: {}", e)))?;
            witness_policy.satisfied(&note)?;

            tracing::debug!(
                origin = %probe.origin,
                tree_size = note.checkpoint.tree_size,
                "building inclusion proof under latest checkpoint"
            );

            let mut builder = ProofBuilder::new(fetcher.as_ref(), note.checkpoint.tree_size);
            let proof = builder.inclusion_proof(probe.leaf_idx).await?;

            bt_merkle::verify_inclusion_proof(
                &leaf_hash,
                probe.leaf_idx,
                note.checkpoint.tree_size,
                &proof,
                &note.checkpoint.root_hash,
            )
            .map_err(|e| Error::Crypto(format!("invalid inclusion proof: {}", e)))?;

            Ok::<_, Error>(proof)
        })
        .await
        .map_err(|_| Error::Network("proof acquisition timed out".to_string()))??;

        let encoded: Vec<String> = proof.iter().map(|n| STANDARD.encode(n)).collect();
        Ok(serde_json::to_vec(&encoded)?)
    }
}
