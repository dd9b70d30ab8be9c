//! Sigsum engine implementation

use crate::bundle::SigsumBundle;
use crate::client::LogClient;
use crate::proof::{InclusionProof, ShortLeaf, SigsumProof};
use crate::witness::WitnessPolicy;
use async_trait::async_trait;
use bt_crypto::{parse_public_key, sha256};
use bt_transparency::{EngineId, Error, Result, TransparencyEngine, SIGSUM};
use std::any::Any;
use std::time::Duration;

/// Deadline shared by the tree-head and inclusion-proof fetches
const GET_PROOF_TIMEOUT: Duration = Duration::from_secs(30);

/// The Sigsum transparency engine and its configuration
#[derive(Default)]
pub struct SigsumEngine {
    /// True if the engine has access to the network
    network: bool,

    /// Trusted public keys to verify log signatures
    log_keys: Vec<[u8; 32]>,

    /// Trusted public keys to verify leaf signatures
    submit_keys: Vec<[u8; 32]>,

    witness_policy: Option<WitnessPolicy>,
}

impl SigsumEngine {
    /// Create an engine; `network` enables the online proof-fetching path
    pub fn new(network: bool) -> Self {
        Self {
            network,
            ..Default::default()
        }
    }

    /// Find the trusted key matching a hex key hash
    fn trusted_key_from_hash(keys: &[[u8; 32]], hash: &str) -> Result<[u8; 32]> {
        let hash: [u8; 32] = hex::decode(hash)
            .ok()
            .and_then(|h| h.try_into().ok())
            .ok_or_else(|| Error::Parse(format!("invalid public key hash {:?}", hash)))?;

        keys.iter()
            .find(|k| sha256(k.as_slice()) == hash)
            .copied()
            .ok_or_else(|| Error::Config("key hash is not matching any of the trusted keys".to_string()))
    }

    fn downcast<'a>(&self, bundle: &'a (dyn Any + Send + Sync)) -> Result<&'a SigsumBundle> {
        let bundle = bundle
            .downcast_ref::<SigsumBundle>()
            .ok_or_else(|| Error::Parse("invalid proof bundle for the Sigsum engine".to_string()))?;

        if bundle.format != SIGSUM {
            return Err(Error::EngineMismatch {
                found: bundle.format,
                expected: SIGSUM,
            });
        }

        Ok(bundle)
    }
}

#[async_trait]
impl TransparencyEngine for SigsumEngine {
    fn engine_id(&self) -> EngineId {
        SIGSUM
    }

    fn parse_proof(&self, bundle: &[u8]) -> Result<(Box<dyn Any + Send + Sync>, Vec<u8>)> {
        let bundle: SigsumBundle = serde_json::from_slice(bundle)?;

        if bundle.format != SIGSUM {
            return Err(Error::EngineMismatch {
                found: bundle.format,
                expected: SIGSUM,
            });
        }

        // the statement is not parsed here; only the proof document and the
        // probing data are validated
        if let Some(proof) = &bundle.proof {
            SigsumProof::from_ascii(proof)?;
        }

        let normalized = serde_json::to_vec_pretty(&bundle)?;
        Ok((Box::new(bundle), normalized))
    }

    fn parse_witness_policy(&self, policy: &[u8]) -> Result<Box<dyn Any + Send + Sync>> {
        Ok(Box::new(WitnessPolicy::parse(policy)?))
    }

    fn set_keys(&mut self, log_keys: &[String], submit_keys: &[String]) -> Result<()> {
        let mut parsed_log = Vec::with_capacity(log_keys.len());
        for key in log_keys {
            parsed_log
                .push(parse_public_key(key).map_err(|e| Error::Parse(e.to_string()))?);
        }

        let mut parsed_submit = Vec::with_capacity(submit_keys.len());
        for key in submit_keys {
            parsed_submit
                .push(parse_public_key(key).map_err(|e| Error::Parse(e.to_string()))?);
        }

        self.log_keys = parsed_log;
        self.submit_keys = parsed_submit;
        Ok(())
    }

    fn set_witness_policy(&mut self, policy: Box<dyn Any + Send + Sync>) -> Result<()> {
        let policy = policy
            .downcast::<WitnessPolicy>()
            .map_err(|_| Error::Config("invalid witness policy for the Sigsum engine".to_string()))?;

        self.witness_policy = Some(*policy);
        Ok(())
    }

    fn reset_witness_policy(&mut self) {
        self.witness_policy = None;
    }

    fn verify_proof(&self, bundle: &(dyn Any + Send + Sync)) -> Result<()> {
        let bundle = self.downcast(bundle)?;

        let proof = match &bundle.proof {
            Some(proof) => SigsumProof::from_ascii(proof)?,
            None => return Err(Error::Config("no inclusion proof in the bundle".to_string())),
        };

        if self.log_keys.is_empty() {
            return Err(Error::NoTrustedLogKey);
        }
        if self.submit_keys.is_empty() {
            return Err(Error::NoTrustedSubmitKey);
        }

        // the logged message is the hash of the statement pre-image, taken
        // over the bundle bytes verbatim
        let message = sha256(&bundle.statement_bytes()?);

        // traverse all trusted key pairs and accept the first that verifies
        let mut last_err = Error::NoTrustedLogKey;
        for log_key in &self.log_keys {
            for submit_key in &self.submit_keys {
                match proof.verify(&message, submit_key, log_key, self.witness_policy.as_ref()) {
                    Ok(()) => return Ok(()),
                    Err(e) => last_err = e,
                }
            }
        }

        Err(last_err)
    }

    async fn get_proof(&self, bundle: &(dyn Any + Send + Sync)) -> Result<Vec<u8>> {
        let bundle = self.downcast(bundle)?;

        let probe = bundle
            .probe
            .as_ref()
            .ok_or_else(|| Error::Config("no probe data in the bundle".to_string()))?;

        if !self.network {
            return Err(Error::Config("transparency engine is off-line".to_string()));
        }

        let witness_policy = self
            .witness_policy
            .as_ref()
            .ok_or_else(|| Error::Config("witness policy not configured".to_string()))?;

        if self.log_keys.is_empty() {
            return Err(Error::NoTrustedLogKey);
        }
        let log_key = Self::trusted_key_from_hash(&self.log_keys, &probe.log_public_key_hash)?;

        if self.submit_keys.is_empty() {
            return Err(Error::NoTrustedSubmitKey);
        }
        let submit_key =
            Self::trusted_key_from_hash(&self.submit_keys, &probe.submit_public_key_hash)?;

        let leaf_signature: [u8; 64] = hex::decode(&probe.leaf_signature)
            .ok()
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| Error::Parse("invalid leaf signature in probe".to_string()))?;

        // the logged message and the leaf identifying it
        let message = sha256(&bundle.statement_bytes()?);
        let checksum = sha256(&message);
        let leaf = ShortLeaf {
            key_hash: sha256(&submit_key),
            signature: leaf_signature,
        };
        let leaf_hash = leaf.leaf_hash(&checksum);

        let log_key_hash = sha256(&log_key);
        let client = LogClient::new(&probe.origin)?;

        let (tree_head, inclusion) = tokio::time::timeout(GET_PROOF_TIMEOUT, async {
            let tree_head = client.get_tree_head().await?;
            tree_head.tree_head.verify(&log_key)?;
            witness_policy.verify_cosigned_tree_head(&log_key_hash, &tree_head)?;

            let inclusion = if tree_head.tree_head.size > 1 {
                client
                    .get_inclusion_proof(tree_head.tree_head.size, &leaf_hash)
                    .await?
            } else {
                InclusionProof::default()
            };

            Ok::<_, Error>((tree_head, inclusion))
        })
        .await
        .map_err(|_| Error::Network("proof acquisition timed out".to_string()))??;

        bt_merkle::verify_inclusion_proof(
            &leaf_hash,
            inclusion.leaf_index,
            tree_head.tree_head.size,
            &inclusion.node_hashes,
            &tree_head.tree_head.root_hash,
        )
        .map_err(|e| Error::Crypto(format!("invalid inclusion proof: {}", e)))?;

        let proof = SigsumProof {
            log_key_hash,
            leaf,
            tree_head,
            inclusion,
        };

        Ok(proof.to_ascii().into_bytes())
    }
}
