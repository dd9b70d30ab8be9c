//! Checkpoint note format parsing and verification.
//!
//! Tile-based transparency logs publish their tree head as a signed note: a
//! text body (origin, tree size, base64 root hash, optional metadata)
//! followed by a blank line and one signature line per signer. Signature
//! lines begin with the Unicode em dash (U+2014), carry the signer name and
//! a base64 value consisting of a 4-byte key ID followed by the signature.
//!
//! Verifier keys use the note format `<name>+<keyhash>+<base64 blob>` where
//! the blob is an algorithm byte (0x01 for Ed25519) followed by the raw
//! public key, and `<keyhash>` is the first four bytes of
//! `SHA-256(name || '\n' || blob)` in hex.

use crate::ed25519::verify_ed25519;
use crate::error::{Error, Result};
use crate::hash::sha256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Algorithm byte for Ed25519 note keys
const ALG_ED25519: u8 = 0x01;

/// A note verifier key for a log or witness
#[derive(Debug, Clone, PartialEq)]
pub struct NoteVerifier {
    /// Signer name (e.g. "log.example.org")
    pub name: String,

    /// 4-byte key ID matching signature lines to this key
    pub key_id: [u8; 4],

    /// Raw Ed25519 public key
    pub public_key: [u8; 32],
}

impl NoteVerifier {
    /// Parse a verifier key in note format
    pub fn parse(vkey: &str) -> Result<Self> {
        let parts: Vec<&str> = vkey.split('+').collect();
        if parts.len() != 3 {
            return Err(Error::InvalidKey(format!(
                "malformed verifier key: {}",
                vkey
            )));
        }

        let name = parts[0];
        if name.is_empty() || name.contains(|c: char| c.is_whitespace()) {
            return Err(Error::InvalidKey(format!(
                "malformed verifier name: {}",
                name
            )));
        }

        if parts[1].len() != 8 {
            return Err(Error::InvalidKey(format!(
                "malformed verifier key hash: {}",
                parts[1]
            )));
        }
        let declared: [u8; 4] = hex::decode(parts[1])?
            .try_into()
            .map_err(|_| Error::InvalidKey(format!("malformed verifier key hash: {}", parts[1])))?;

        let blob = STANDARD.decode(parts[2])?;
        if blob.len() != 33 || blob[0] != ALG_ED25519 {
            return Err(Error::InvalidKey(
                "verifier key is not an Ed25519 key".to_string(),
            ));
        }

        let computed = key_id(name, &blob);
        if computed != declared {
            return Err(Error::InvalidKey(format!(
                "verifier key hash mismatch for {}",
                name
            )));
        }

        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(&blob[1..]);

        Ok(Self {
            name: name.to_string(),
            key_id: declared,
            public_key,
        })
    }
}

/// Compute the 4-byte key ID for a signer name and key blob
fn key_id(name: &str, blob: &[u8]) -> [u8; 4] {
    let mut data = Vec::with_capacity(name.len() + 1 + blob.len());
    data.extend_from_slice(name.as_bytes());
    data.push(b'\n');
    data.extend_from_slice(blob);

    let hash = sha256(&data);
    [hash[0], hash[1], hash[2], hash[3]]
}

/// A parsed checkpoint body: the log's commitment to a tree state
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// The origin (log name) from the first line
    pub origin: String,

    /// Number of leaves in the tree
    pub tree_size: u64,

    /// Root hash of the tree
    pub root_hash: [u8; 32],

    /// Any further body lines
    pub metadata: Vec<String>,
}

impl Checkpoint {
    /// Parse a checkpoint body (the part of a note before the blank line)
    pub fn from_text(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < 3 {
            return Err(Error::Checkpoint(format!(
                "checkpoint has {} lines, expected at least 3",
                lines.len()
            )));
        }

        let origin = lines[0].trim();
        if origin.is_empty() {
            return Err(Error::Checkpoint("empty origin".to_string()));
        }

        let tree_size = lines[1]
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::Checkpoint(format!("invalid tree size: {}", lines[1])))?;

        let root = STANDARD
            .decode(lines[2].trim())
            .map_err(|e| Error::Checkpoint(format!("invalid root hash base64: {}", e)))?;
        let root_hash: [u8; 32] = root
            .try_into()
            .map_err(|_| Error::Checkpoint("root hash is not 32 bytes".to_string()))?;

        let metadata = lines[3..].iter().map(|l| l.trim().to_string()).collect();

        Ok(Self {
            origin: origin.to_string(),
            tree_size,
            root_hash,
            metadata,
        })
    }
}

/// One signature line of a note
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSignature {
    /// Signer name
    pub name: String,

    /// 4-byte key ID from the start of the decoded value
    pub key_id: [u8; 4],

    /// Signature bytes following the key ID
    pub signature: Vec<u8>,
}

impl NoteSignature {
    /// Parse a `— <name> <base64>` signature line
    pub fn from_line(line: &str) -> Result<Self> {
        let rest = line.strip_prefix('\u{2014}').ok_or_else(|| {
            Error::Checkpoint("signature line must start with em dash (U+2014)".to_string())
        })?;

        let parts: Vec<&str> = rest.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(Error::Checkpoint(
                "signature line must be: \u{2014} <name> <base64>".to_string(),
            ));
        }

        let decoded = STANDARD
            .decode(parts[1])
            .map_err(|e| Error::Checkpoint(format!("invalid signature base64: {}", e)))?;
        if decoded.len() < 5 {
            return Err(Error::Checkpoint(
                "signature shorter than key ID".to_string(),
            ));
        }

        let key_id: [u8; 4] = decoded[..4]
            .try_into()
            .map_err(|_| Error::Checkpoint("failed to extract key ID".to_string()))?;

        Ok(Self {
            name: parts[0].to_string(),
            key_id,
            signature: decoded[4..].to_vec(),
        })
    }
}

/// A complete signed note: checkpoint body plus signature lines
#[derive(Debug, Clone, PartialEq)]
pub struct SignedNote {
    /// The parsed checkpoint body
    pub checkpoint: Checkpoint,

    /// The raw body text, trailing newline included; this is what signers sign
    pub body: String,

    /// All signature lines
    pub signatures: Vec<NoteSignature>,
}

impl SignedNote {
    /// Parse a signed note from its text form
    pub fn from_text(text: &str) -> Result<Self> {
        let (body, sig_text) = text
            .split_once("\n\n")
            .ok_or_else(|| Error::Checkpoint("missing blank line separator".to_string()))?;

        let checkpoint = Checkpoint::from_text(body)?;

        let mut signatures = Vec::new();
        for line in sig_text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            signatures.push(NoteSignature::from_line(line)?);
        }
        if signatures.is_empty() {
            return Err(Error::Checkpoint("note carries no signatures".to_string()));
        }

        Ok(Self {
            checkpoint,
            body: format!("{}\n", body),
            signatures,
        })
    }

    /// Verify the note under one verifier key
    ///
    /// Succeeds when a signature line matches the verifier's name and key ID
    /// and its Ed25519 signature over the body is valid.
    pub fn verify(&self, verifier: &NoteVerifier) -> Result<()> {
        let sig = self
            .signatures
            .iter()
            .find(|s| s.name == verifier.name && s.key_id == verifier.key_id)
            .ok_or_else(|| {
                Error::Verification(format!("no signature from {}", verifier.name))
            })?;

        verify_ed25519(&verifier.public_key, self.body.as_bytes(), &sig.signature)
            .map_err(|_| Error::Verification(format!("invalid signature from {}", verifier.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ed25519::SigningKey;
    use aws_lc_rs::signature::{Ed25519KeyPair, KeyPair as _};

    // vkey from the note format documentation
    const VKEY: &str = "PeterNeumann+c74f20a3+ARpc2QcUPDhMQegwxbzhKqiBfsVkmqq/LDE4izWy10TW";

    #[test]
    fn test_parse_verifier_key() {
        let v = NoteVerifier::parse(VKEY).unwrap();
        assert_eq!(v.name, "PeterNeumann");
        assert_eq!(hex::encode(v.key_id), "c74f20a3");
    }

    #[test]
    fn test_parse_verifier_key_rejects_bad_hash() {
        // truncated hash segment
        let bad = "PeterNeumann+c74f203+ARpc2QcUPDhMQegwxbzKqiBfsVkmqq/LDE4izWy10TW";
        assert!(NoteVerifier::parse(bad).is_err());
    }

    #[test]
    fn test_parse_verifier_key_rejects_wrong_hash() {
        let bad = "PeterNeumann+00000000+ARpc2QcUPDhMQegwxbzhKqiBfsVkmqq/LDE4izWy10TW";
        assert!(NoteVerifier::parse(bad).is_err());
    }

    #[test]
    fn test_parse_checkpoint() {
        let text = "log.example.org\n8584\nuzTMCXORU4P578THD4xrb5W3TMYwRE+oMYLihfiU6QA=";
        let cp = Checkpoint::from_text(text).unwrap();
        assert_eq!(cp.origin, "log.example.org");
        assert_eq!(cp.tree_size, 8584);
        assert!(cp.metadata.is_empty());
    }

    fn signed_fixture() -> (String, NoteVerifier) {
        let seed = [7u8; 32];
        let pair = Ed25519KeyPair::from_seed_unchecked(&seed).unwrap();
        let mut public = [0u8; 32];
        public.copy_from_slice(pair.public_key().as_ref());
        let key = SigningKey::from_seed(&seed, &public).unwrap();

        let name = "log.example.org";
        let mut blob = vec![ALG_ED25519];
        blob.extend_from_slice(&public);
        let id = key_id(name, &blob);
        let vkey = format!("{}+{}+{}", name, hex::encode(id), STANDARD.encode(&blob));

        let body = "log.example.org\n42\nuzTMCXORU4P578THD4xrb5W3TMYwRE+oMYLihfiU6QA=\n";
        let sig = key.sign(body.as_bytes());
        let mut value = id.to_vec();
        value.extend_from_slice(&sig);
        let note = format!(
            "{}\n\n\u{2014} {} {}\n",
            body.trim_end(),
            name,
            STANDARD.encode(value)
        );

        (note, NoteVerifier::parse(&vkey).unwrap())
    }

    #[test]
    fn test_signed_note_verify() {
        let (note, verifier) = signed_fixture();
        let parsed = SignedNote::from_text(&note).unwrap();
        assert!(parsed.verify(&verifier).is_ok());
    }

    #[test]
    fn test_signed_note_rejects_unknown_signer() {
        let (note, _) = signed_fixture();
        let parsed = SignedNote::from_text(&note).unwrap();

        let other = NoteVerifier::parse(VKEY).unwrap();
        assert!(parsed.verify(&other).is_err());
    }
}
