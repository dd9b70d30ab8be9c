//! Sigsum transparency engine
//!
//! Sigsum logs commit to a leaf derived from the submitted message: the leaf
//! carries the double-SHA-256 checksum of the statement, the submitter's
//! signature over it, and the hash of the submitter's key. Tree heads are
//! signed by the log and optionally cosigned by witnesses; proofs travel in
//! Sigsum's line-oriented ASCII format.

pub mod ascii;
pub mod bundle;
pub mod client;
pub mod engine;
pub mod probe;
pub mod proof;
pub mod witness;

pub use bundle::SigsumBundle;
pub use client::LogClient;
pub use engine::SigsumEngine;
pub use probe::Probe;
pub use proof::{Cosignature, CosignedTreeHead, InclusionProof, ShortLeaf, SigsumProof, TreeHead};
pub use witness::WitnessPolicy;
