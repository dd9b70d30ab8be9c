//! Statement model and parsing

use crate::error::{Error, Result};
use bt_artifact::{CategoryId, Registry};
use serde::{Deserialize, Serialize};

/// A signature over the statement's artifacts, carrying the signer's public
/// key to ease the verifier while checking its validity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureEntry {
    /// Ed25519 signer public key in OpenSSH format
    pub pub_key: String,

    /// Ed25519 signature in hex format
    pub signature: String,
}

/// Container for the claims of a single artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// Artifact category (e.g. 1: LinuxKernel, 2: Initrd, 3: Dtb, ...)
    pub category: CategoryId,

    /// Claims for this artifact, kept as raw JSON
    ///
    /// The supported set of claims depends on the artifact category; the
    /// value must decode under the handler registered for `category`.
    pub claims: serde_json::Value,
}

/// The statement logged when releasing a new bundle of artifacts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statement {
    /// Human-readable title for the bundle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Bundle version, using Semantic Versioning 2.0.0 (see semver.org)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Artifact claims
    pub artifacts: Vec<ArtifactEntry>,

    /// Statement signatures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<SignatureEntry>,
}

impl Statement {
    /// Parse a logged statement from its serialized JSON
    ///
    /// Every artifact must carry a category with a registered handler, and
    /// its claims must decode under that handler.
    pub fn parse(json: &[u8], registry: &Registry) -> Result<Self> {
        let statement: Statement = serde_json::from_slice(json)?;

        if statement.artifacts.is_empty() {
            return Err(Error::Validation(
                "statement claims no artifacts".to_string(),
            ));
        }

        for artifact in &statement.artifacts {
            let handler = registry.handler(artifact.category)?;
            let claims = serde_json::to_vec(&artifact.claims)?;
            handler.parse_claims(&claims)?;
        }

        tracing::debug!(
            artifacts = statement.artifacts.len(),
            signatures = statement.signatures.len(),
            "parsed statement"
        );

        Ok(statement)
    }

    /// Canonical encoding of the `artifacts` sub-document
    ///
    /// This is the exact byte sequence covered by statement signatures:
    /// compact JSON with the claims' original key order preserved.
    pub fn canonical_artifacts(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.artifacts)?)
    }
}
