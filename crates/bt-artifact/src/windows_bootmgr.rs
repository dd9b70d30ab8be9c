//! WindowsBootMgr artifact category
//!
//! The version requirements are semver comparisons; claims whose version does
//! not parse as semver are rejected when a version requirement is present.
//! Real-world Windows Boot Manager version strings (e.g.
//! "10.0.26100.1882") may not conform and would need a dedicated comparator.

use crate::common;
use crate::error::{Error, Result};
use crate::registry::{Handler, Opaque};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Supported policy requirements for a WindowsBootMgr artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    /// Required SHA-512 hash of the artifact
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,

    /// Required minimum version
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub min_version: String,

    /// Maximum allowed version
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub max_version: String,
}

/// Supported claims for a WindowsBootMgr artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Filename of the artifact
    #[serde(default)]
    pub file_name: String,

    /// SHA-512 hash of the artifact
    #[serde(default)]
    pub hash: String,

    /// Artifact version
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// Handler for the WindowsBootMgr category
pub struct WindowsBootMgr;

impl Handler for WindowsBootMgr {
    fn parse_requirements(&self, json: &[u8]) -> Result<Opaque> {
        let r: Requirements = serde_json::from_slice(json)?;
        Ok(Box::new(r))
    }

    fn parse_claims(&self, json: &[u8]) -> Result<Opaque> {
        let c: Claims = serde_json::from_slice(json)?;
        Ok(Box::new(c))
    }

    fn check(
        &self,
        requirements: &(dyn Any + Send + Sync),
        claims: &(dyn Any + Send + Sync),
    ) -> Result<()> {
        let r = requirements
            .downcast_ref::<Requirements>()
            .ok_or_else(|| Error::InvalidInput("invalid policy requirements for WindowsBootMgr".to_string()))?;
        let c = claims
            .downcast_ref::<Claims>()
            .ok_or_else(|| Error::InvalidInput("invalid claims for WindowsBootMgr".to_string()))?;

        common::check_hash(&r.hash, &c.hash)?;
        common::check_min_version(&r.min_version, &c.version)?;
        common::check_max_version(&r.max_version, &c.version)?;

        Ok(())
    }
}
