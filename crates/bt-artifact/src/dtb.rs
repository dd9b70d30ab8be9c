//! Dtb (device tree blob) artifact category
//!
//! On top of the shared boot-artifact fields, device trees expose their
//! source (`dts`) to the same match/include/not-include predicates used for
//! metadata, so a policy can pin hardware description details.

use crate::common;
use crate::error::{Error, Result};
use crate::registry::{Handler, Opaque};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Supported policy requirements for a Dtb artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub min_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub max_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub license: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub min_timestamp: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metadata: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_include: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_not_include: Vec<String>,

    /// Allow only artifacts claiming exactly this device tree source
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dts: String,

    /// Allow only artifacts whose claimed source includes all of these strings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dts_include: Vec<String>,

    /// Allow only artifacts whose claimed source includes none of these strings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dts_not_include: Vec<String>,
}

/// Supported claims for a Dtb artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub license: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_urls: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metadata: String,

    /// Device tree source the blob was compiled from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dts: String,
}

/// Handler for the Dtb category
pub struct Dtb;

impl Handler for Dtb {
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
            .ok_or_else(|| Error::InvalidInput("invalid policy requirements for Dtb".to_string()))?;
        let c = claims
            .downcast_ref::<Claims>()
            .ok_or_else(|| Error::InvalidInput("invalid claims for Dtb".to_string()))?;

        common::check_min_version(&r.min_version, &c.version)?;
        common::check_max_version(&r.max_version, &c.version)?;

        if !r.architecture.is_empty() && r.architecture != c.architecture {
            return Err(Error::RequirementUnmet(format!(
                "architecture {:?} does not meet requirement",
                c.architecture
            )));
        }

        common::check_array_inclusion(&r.license, &c.license)
            .map_err(|e| Error::RequirementUnmet(format!("license requirement not met: {}", e)))?;

        common::check_min_timestamp(&r.min_timestamp, &c.timestamp)?;

        common::check_string_match(&r.metadata, &c.metadata)
            .map_err(|_| Error::RequirementUnmet("metadata matching requirement not met".to_string()))?;

        for require_metadata in &r.metadata_include {
            common::check_string_include(require_metadata, &c.metadata).map_err(|e| {
                Error::RequirementUnmet(format!("metadata inclusion requirement not met: {}", e))
            })?;
        }

        for require_metadata in &r.metadata_not_include {
            common::check_string_not_include(require_metadata, &c.metadata).map_err(|e| {
                Error::RequirementUnmet(format!("metadata non-inclusion requirement not met: {}", e))
            })?;
        }

        common::check_string_match(&r.dts, &c.dts)
            .map_err(|_| Error::RequirementUnmet("dts matching requirement not met".to_string()))?;

        for require_dts in &r.dts_include {
            common::check_string_include(require_dts, &c.dts).map_err(|e| {
                Error::RequirementUnmet(format!("dts inclusion requirement not met: {}", e))
            })?;
        }

        for require_dts in &r.dts_not_include {
            common::check_string_not_include(require_dts, &c.dts).map_err(|e| {
                Error::RequirementUnmet(format!("dts non-inclusion requirement not met: {}", e))
            })?;
        }

        Ok(())
    }
}
