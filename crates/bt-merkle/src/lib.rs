//! RFC 6962 Merkle tree verification for boot-transparency
//!
//! Both supported transparency engines commit to their leaves with RFC 6962
//! hashing (0x00 leaf prefix, 0x01 node prefix, SHA-256). This crate provides
//! the hashing primitives and the inclusion-proof verification they share.

pub mod error;
pub mod proof;
pub mod tree;

pub use error::{Error, Result};
pub use proof::{root_from_inclusion_proof, verify_inclusion_proof};
pub use tree::{hash_children, hash_leaf, HASH_SIZE, LEAF_HASH_PREFIX, NODE_HASH_PREFIX};
