//! Sigsum proof document: tree head, leaf and inclusion path
//!
//! The wire form is Sigsum's ASCII format, three blank-line separated
//! sections: the proof header (`version`, `log`, `leaf`), the cosigned tree
//! head (`size`, `root_hash`, `signature`, `cosignature*`) and, for trees
//! larger than a single leaf, the inclusion path (`leaf_index`,
//! `node_hash*`).

use crate::ascii;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bt_crypto::{attach_namespace, sha256, verify_ed25519, TREE_LEAF_NAMESPACE};
use bt_transparency::{Error, Result};

/// Supported proof document version
pub const PROOF_VERSION: u64 = 2;

/// Checkpoint origin prefix for Sigsum logs
const CHECKPOINT_NAME_PREFIX: &str = "sigsum.org/v1/tree/";

/// Namespace prefixing witness cosignatures
const COSIGNATURE_NAMESPACE: &str = "cosignature/v1";

/// A log's commitment to a tree state
#[derive(Debug, Clone, PartialEq)]
pub struct TreeHead {
    /// Number of leaves in the tree
    pub size: u64,

    /// Root hash of the tree
    pub root_hash: [u8; 32],

    /// Log signature over the checkpoint serialization of this tree head
    pub signature: [u8; 64],
}

impl TreeHead {
    /// The checkpoint serialization signed by the log and its witnesses
    ///
    /// The origin line is derived from the log key hash.
    pub fn checkpoint(&self, log_key_hash: &[u8; 32]) -> String {
        format!(
            "{}{}\n{}\n{}\n",
            CHECKPOINT_NAME_PREFIX,
            hex::encode(log_key_hash),
            self.size,
            STANDARD.encode(self.root_hash)
        )
    }

    /// Verify the log signature over this tree head
    pub fn verify(&self, log_key: &[u8; 32]) -> Result<()> {
        let checkpoint = self.checkpoint(&sha256(log_key));

        verify_ed25519(log_key, checkpoint.as_bytes(), &self.signature)
            .map_err(|_| Error::Crypto("invalid tree head signature".to_string()))
    }
}

/// A witness cosignature over a tree head
#[derive(Debug, Clone, PartialEq)]
pub struct Cosignature {
    /// Hash of the witness public key
    pub key_hash: [u8; 32],

    /// Cosigning timestamp (Unix seconds)
    pub timestamp: u64,

    /// Witness signature
    pub signature: [u8; 64],
}

impl Cosignature {
    /// Verify this cosignature under a witness key
    pub fn verify(
        &self,
        witness_key: &[u8; 32],
        log_key_hash: &[u8; 32],
        tree_head: &TreeHead,
    ) -> Result<()> {
        let message = format!(
            "{}\ntime {}\n{}",
            COSIGNATURE_NAMESPACE,
            self.timestamp,
            tree_head.checkpoint(log_key_hash)
        );

        verify_ed25519(witness_key, message.as_bytes(), &self.signature)
            .map_err(|_| Error::Crypto("invalid cosignature".to_string()))
    }
}

/// A tree head together with its witness cosignatures
#[derive(Debug, Clone, PartialEq)]
pub struct CosignedTreeHead {
    pub tree_head: TreeHead,
    pub cosignatures: Vec<Cosignature>,
}

impl CosignedTreeHead {
    /// Parse the tree head section of a proof document
    pub fn from_ascii_lines(lines: &[&str]) -> Result<Self> {
        if lines.len() < 3 {
            return Err(Error::Parse("truncated tree head section".to_string()));
        }

        let size = ascii::integer(ascii::value(lines[0], "size")?)?;
        let root_hash = ascii::hex_array(ascii::value(lines[1], "root_hash")?)?;
        let signature = ascii::hex_array(ascii::value(lines[2], "signature")?)?;

        let mut cosignatures = Vec::new();
        for line in &lines[3..] {
            let fields: Vec<&str> = ascii::value(line, "cosignature")?.split(' ').collect();
            if fields.len() != 3 {
                return Err(Error::Parse(format!(
                    "malformed cosignature line: {:?}",
                    line
                )));
            }

            cosignatures.push(Cosignature {
                key_hash: ascii::hex_array(fields[0])?,
                timestamp: ascii::integer(fields[1])?,
                signature: ascii::hex_array(fields[2])?,
            });
        }

        Ok(Self {
            tree_head: TreeHead {
                size,
                root_hash,
                signature,
            },
            cosignatures,
        })
    }

    /// Serialize the tree head section
    pub fn to_ascii(&self) -> String {
        let mut out = format!(
            "size={}\nroot_hash={}\nsignature={}\n",
            self.tree_head.size,
            hex::encode(self.tree_head.root_hash),
            hex::encode(self.tree_head.signature)
        );

        for cs in &self.cosignatures {
            out.push_str(&format!(
                "cosignature={} {} {}\n",
                hex::encode(cs.key_hash),
                cs.timestamp,
                hex::encode(cs.signature)
            ));
        }

        out
    }
}

/// The leaf identity carried in a proof header: submitter key hash and leaf
/// signature; the checksum is recomputed from the statement
#[derive(Debug, Clone, PartialEq)]
pub struct ShortLeaf {
    pub key_hash: [u8; 32],
    pub signature: [u8; 64],
}

impl ShortLeaf {
    /// Verify the leaf signature over a message checksum
    ///
    /// The submitter signs the namespaced checksum, not the raw one.
    pub fn verify(&self, submit_key: &[u8; 32], checksum: &[u8; 32]) -> Result<()> {
        let namespaced = attach_namespace(TREE_LEAF_NAMESPACE, checksum);

        verify_ed25519(submit_key, &namespaced, &self.signature)
            .map_err(|_| Error::Crypto("invalid leaf signature".to_string()))
    }

    /// The RFC 6962 hash of the full leaf for a given message checksum
    pub fn leaf_hash(&self, checksum: &[u8; 32]) -> [u8; 32] {
        let mut binary = Vec::with_capacity(128);
        binary.extend_from_slice(checksum);
        binary.extend_from_slice(&self.signature);
        binary.extend_from_slice(&self.key_hash);

        bt_merkle::hash_leaf(&binary)
    }
}

/// An inclusion path from a leaf to the tree head
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InclusionProof {
    pub leaf_index: u64,
    pub node_hashes: Vec<[u8; 32]>,
}

impl InclusionProof {
    /// Parse the inclusion section of a proof document
    pub fn from_ascii_lines(lines: &[&str]) -> Result<Self> {
        if lines.is_empty() {
            return Err(Error::Parse("truncated inclusion section".to_string()));
        }

        let leaf_index = ascii::integer(ascii::value(lines[0], "leaf_index")?)?;

        let mut node_hashes = Vec::new();
        for line in &lines[1..] {
            node_hashes.push(ascii::hex_array(ascii::value(line, "node_hash")?)?);
        }

        Ok(Self {
            leaf_index,
            node_hashes,
        })
    }

    /// Serialize the inclusion section
    pub fn to_ascii(&self) -> String {
        let mut out = format!("leaf_index={}\n", self.leaf_index);
        for node in &self.node_hashes {
            out.push_str(&format!("node_hash={}\n", hex::encode(node)));
        }
        out
    }
}

/// A complete Sigsum proof document
#[derive(Debug, Clone, PartialEq)]
pub struct SigsumProof {
    /// Hash of the log key the proof claims to verify under
    pub log_key_hash: [u8; 32],

    /// Leaf identity
    pub leaf: ShortLeaf,

    /// Cosigned tree head
    pub tree_head: CosignedTreeHead,

    /// Inclusion path; empty with index zero for single-leaf trees
    pub inclusion: InclusionProof,
}

impl SigsumProof {
    /// Parse an ASCII proof document
    pub fn from_ascii(text: &str) -> Result<Self> {
        let sections = ascii::sections(text);
        if sections.len() < 2 {
            return Err(Error::Parse(
                "proof document has fewer than two sections".to_string(),
            ));
        }

        let header = &sections[0];
        if header.len() != 3 {
            return Err(Error::Parse("malformed proof header".to_string()));
        }

        let version = ascii::integer(ascii::value(header[0], "version")?)?;
        if version != PROOF_VERSION {
            return Err(Error::Parse(format!(
                "unsupported proof version {}",
                version
            )));
        }

        let log_key_hash = ascii::hex_array(ascii::value(header[1], "log")?)?;

        let leaf_fields: Vec<&str> = ascii::value(header[2], "leaf")?.split(' ').collect();
        if leaf_fields.len() != 2 {
            return Err(Error::Parse(format!(
                "malformed leaf line: {:?}",
                header[2]
            )));
        }
        let leaf = ShortLeaf {
            key_hash: ascii::hex_array(leaf_fields[0])?,
            signature: ascii::hex_array(leaf_fields[1])?,
        };

        let tree_head = CosignedTreeHead::from_ascii_lines(&sections[1])?;

        let inclusion = match sections.get(2) {
            Some(lines) => InclusionProof::from_ascii_lines(lines)?,
            None if tree_head.tree_head.size == 1 => InclusionProof::default(),
            None => {
                return Err(Error::Parse(
                    "missing inclusion section for tree size > 1".to_string(),
                ))
            }
        };

        Ok(Self {
            log_key_hash,
            leaf,
            tree_head,
            inclusion,
        })
    }

    /// Serialize the proof as a self-contained ASCII document
    ///
    /// The header lines are always emitted so the output round-trips
    /// through `from_ascii`.
    pub fn to_ascii(&self) -> String {
        let mut out = format!(
            "version={}\nlog={}\nleaf={} {}\n\n",
            PROOF_VERSION,
            hex::encode(self.log_key_hash),
            hex::encode(self.leaf.key_hash),
            hex::encode(self.leaf.signature)
        );

        out.push_str(&self.tree_head.to_ascii());

        if self.tree_head.tree_head.size > 1 {
            out.push('\n');
            out.push_str(&self.inclusion.to_ascii());
        }

        out
    }

    /// Verify the proof for a message under one (log key, submit key) pair
    ///
    /// `message` is the SHA-256 of the logged statement bytes; the leaf
    /// checksum is its second SHA-256. When a witness policy is given the
    /// tree head must additionally satisfy its cosignature quorum.
    pub fn verify(
        &self,
        message: &[u8; 32],
        submit_key: &[u8; 32],
        log_key: &[u8; 32],
        witness_policy: Option<&crate::witness::WitnessPolicy>,
    ) -> Result<()> {
        if sha256(log_key) != self.log_key_hash {
            return Err(Error::Crypto("unknown log key hash".to_string()));
        }

        if sha256(submit_key) != self.leaf.key_hash {
            return Err(Error::Crypto("unknown leaf key hash".to_string()));
        }

        let checksum = sha256(message);
        self.leaf.verify(submit_key, &checksum)?;
        self.tree_head.tree_head.verify(log_key)?;

        if let Some(policy) = witness_policy {
            policy.verify_cosigned_tree_head(&self.log_key_hash, &self.tree_head)?;
        }

        let leaf_hash = self.leaf.leaf_hash(&checksum);
        bt_merkle::verify_inclusion_proof(
            &leaf_hash,
            self.inclusion.leaf_index,
            self.tree_head.tree_head.size,
            &self.inclusion.node_hashes,
            &self.tree_head.tree_head.root_hash,
        )
        .map_err(|e| Error::Crypto(format!("invalid inclusion proof: {}", e)))
    }
}
