//! Ed25519 signing and verification using aws-lc-rs

use crate::error::{Error, Result};
use aws_lc_rs::signature::{self, KeyPair as _};

/// Ed25519 public key size in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Ed25519 signature size in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Verify an Ed25519 signature over a message
///
/// The public key is the raw 32-byte curve point, the signature the raw
/// 64-byte value.
pub fn verify_ed25519(public_key: &[u8; PUBLIC_KEY_SIZE], message: &[u8], sig: &[u8]) -> Result<()> {
    let key = signature::UnparsedPublicKey::new(&signature::ED25519, public_key.as_slice());
    key.verify(message, sig)
        .map_err(|_| Error::Verification("Ed25519 signature invalid".to_string()))
}

/// An Ed25519 signing key
pub struct SigningKey {
    keypair: signature::Ed25519KeyPair,
}

impl SigningKey {
    /// Create a signing key from a 32-byte seed and its public key
    ///
    /// The pairing is checked: a seed that does not produce the given public
    /// key is rejected.
    pub fn from_seed(seed: &[u8], public_key: &[u8]) -> Result<Self> {
        let keypair = signature::Ed25519KeyPair::from_seed_and_public_key(seed, public_key)
            .map_err(|e| Error::InvalidKey(format!("invalid Ed25519 seed: {}", e)))?;

        Ok(Self { keypair })
    }

    /// Sign a message, returning the raw 64-byte signature
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        let sig = self.keypair.sign(message);
        let mut result = [0u8; SIGNATURE_SIZE];
        result.copy_from_slice(sig.as_ref());
        result
    }

    /// The raw 32-byte public key
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
        let mut result = [0u8; PUBLIC_KEY_SIZE];
        result.copy_from_slice(self.keypair.public_key().as_ref());
        result
    }
}
