//! Boot-transparency statement
//!
//! The statement is the document that gets logged when a bundle of boot
//! artifacts is released: a set of per-artifact claims plus any number of
//! detached signatures. Signatures cover the canonical JSON encoding of the
//! `artifacts` sub-document only, so appending a signature never invalidates
//! the previous ones.

pub mod error;
pub mod sign;
pub mod statement;

pub use error::{Error, Result};
pub use sign::{sign, verify_signature};
pub use statement::{ArtifactEntry, SignatureEntry, Statement};
