//! Cryptographic primitives for boot-transparency
//!
//! This crate provides the hashing and Ed25519 functionality shared by the
//! statement, policy and transparency-engine crates, together with the key
//! and message formats they consume: OpenSSH ed25519 keys, namespaced
//! signing messages, and the note (checkpoint) format used by tile-based
//! logs.

pub mod ed25519;
pub mod error;
pub mod hash;
pub mod note;
pub mod ssh;

pub use ed25519::{verify_ed25519, SigningKey, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
pub use error::{Error, Result};
pub use hash::{sha256, sha512, HASH_SIZE};
pub use note::{Checkpoint, NoteSignature, NoteVerifier, SignedNote};
pub use ssh::{
    attach_namespace, encode_public_key, parse_private_key, parse_public_key, TREE_LEAF_NAMESPACE,
};
