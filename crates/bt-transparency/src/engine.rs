//! Transparency engine interface and registry

use crate::error::{Error, Result};
use crate::EngineId;
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;

/// High-level interface of a transparency engine
///
/// Engines own their trust configuration (log keys, submit keys, witness
/// policy) and expose offline proof verification plus an online path that
/// fetches a fresh tree head and inclusion proof from the log. Bundles
/// travel as type-erased views produced by `parse_proof`; each engine
/// downcasts back to its own bundle shape.
#[async_trait]
pub trait TransparencyEngine: Send + Sync {
    /// The format identifier this engine serves
    fn engine_id(&self) -> EngineId;

    /// Parse a serialized proof bundle into the engine's typed view
    ///
    /// Returns the view together with a normalized re-serialization of the
    /// bundle. Fails with `EngineMismatch` when the bundle's format does not
    /// match this engine.
    fn parse_proof(&self, bundle: &[u8]) -> Result<(Box<dyn Any + Send + Sync>, Vec<u8>)>;

    /// Parse a witness policy in the format expected by this engine
    fn parse_witness_policy(&self, policy: &[u8]) -> Result<Box<dyn Any + Send + Sync>>;

    /// Set the trusted log and submit public keys
    ///
    /// Keys are validated here; previously configured keys are replaced
    /// wholesale.
    fn set_keys(&mut self, log_keys: &[String], submit_keys: &[String]) -> Result<()>;

    /// Set the witness policy, as returned by `parse_witness_policy`
    fn set_witness_policy(&mut self, policy: Box<dyn Any + Send + Sync>) -> Result<()>;

    /// Drop any configured witness policy
    fn reset_witness_policy(&mut self);

    /// Verify the inclusion proof carried by the bundle, offline
    fn verify_proof(&self, bundle: &(dyn Any + Send + Sync)) -> Result<()>;

    /// Fetch a fresh tree head and inclusion proof from the origin log
    ///
    /// Returns the serialized proof in the engine's wire form. The whole
    /// operation is bounded by a single 30-second deadline.
    async fn get_proof(&self, bundle: &(dyn Any + Send + Sync)) -> Result<Vec<u8>>;
}

/// Registry of transparency engines keyed by format identifier
///
/// Populated at start-up, before the first verification.
#[derive(Default)]
pub struct EngineRegistry {
    engines: HashMap<EngineId, Box<dyn TransparencyEngine>>,
}

impl EngineRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }

    /// Register an engine under its format identifier
    ///
    /// Registration is fail-closed: a second engine for the same format is
    /// rejected.
    pub fn register(&mut self, engine: Box<dyn TransparencyEngine>) -> Result<()> {
        let id = engine.engine_id();
        if self.engines.contains_key(&id) {
            return Err(Error::Config(format!(
                "transparency engine already registered for format {}",
                id
            )));
        }

        self.engines.insert(id, engine);
        Ok(())
    }

    /// Return the engine registered for a format
    pub fn engine(&self, id: EngineId) -> Result<&dyn TransparencyEngine> {
        self.engines
            .get(&id)
            .map(|e| e.as_ref())
            .ok_or(Error::UnknownEngine(id))
    }

    /// Return the engine registered for a format, mutably
    pub fn engine_mut(&mut self, id: EngineId) -> Result<&mut Box<dyn TransparencyEngine>> {
        self.engines.get_mut(&id).ok_or(Error::UnknownEngine(id))
    }
}
