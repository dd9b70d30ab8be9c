//! RFC 6962 Merkle tree hashing
//!
//! Domain separation via prefixes (0x00 for leaves, 0x01 for interior nodes)
//! over SHA-256.

use sha2::{Digest, Sha256};

/// Prefix for leaf hashes
pub const LEAF_HASH_PREFIX: u8 = 0x00;

/// Prefix for interior node hashes
pub const NODE_HASH_PREFIX: u8 = 0x01;

/// Hash size in bytes (SHA-256)
pub const HASH_SIZE: usize = 32;

/// Hash a leaf entry: SHA256(0x00 || data)
pub fn hash_leaf(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_HASH_PREFIX]);
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash two children into their parent: SHA256(0x01 || left || right)
pub fn hash_children(left: &[u8; HASH_SIZE], right: &[u8; HASH_SIZE]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_HASH_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}
