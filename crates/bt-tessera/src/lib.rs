//! Tessera transparency engine
//!
//! Tile-based logs commit to the statement with a plain RFC 6962 leaf hash.
//! The log publishes its tree head as a signed note (checkpoint) verified
//! under note-format keys; witnesses countersign the same note. Inclusion
//! proofs are built from the log's level tiles and travel as an array of
//! base64 node hashes.

pub mod bundle;
pub mod engine;
pub mod fetch;
pub mod probe;
pub mod tile;
pub mod witness;

pub use bundle::TesseraBundle;
pub use engine::TesseraEngine;
pub use fetch::{FileFetcher, HttpFetcher, TileFetcher};
pub use probe::Probe;
pub use tile::ProofBuilder;
pub use witness::WitnessGroup;
