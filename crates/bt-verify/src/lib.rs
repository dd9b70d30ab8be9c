//! Boot-transparency verification pipeline
//!
//! Wires the transparency engines, the statement parser and the policy
//! engine into the single fail-closed check a boot stage runs before
//! handing over control: parse the proof bundle, verify log inclusion,
//! parse the logged statement, check it against the boot policy.

pub mod error;
pub mod verify;

pub use error::{Error, Result};
pub use verify::{TrustConfig, Verifier};
