//! UEFIBinary artifact category

use crate::common;
use crate::error::{Error, Result};
use crate::registry::{Handler, Opaque};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Supported policy requirements for a UEFIBinary artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub min_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub max_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tainted: bool,

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
}

/// Supported claims for a UEFIBinary artifact
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

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tainted: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub license: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_urls: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metadata: String,
}

/// Handler for the UEFIBinary category
pub struct UefiBinary;

impl Handler for UefiBinary {
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
            .ok_or_else(|| Error::InvalidInput("invalid policy requirements for UEFIBinary".to_string()))?;
        let c = claims
            .downcast_ref::<Claims>()
            .ok_or_else(|| Error::InvalidInput("invalid claims for UEFIBinary".to_string()))?;

        common::check_min_version(&r.min_version, &c.version)?;
        common::check_max_version(&r.max_version, &c.version)?;

        if !r.architecture.is_empty() && r.architecture != c.architecture {
            return Err(Error::RequirementUnmet(format!(
                "architecture {:?} does not meet requirement",
                c.architecture
            )));
        }

        if c.tainted && !r.tainted {
            return Err(Error::RequirementUnmet("tainted requirement not met".to_string()));
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

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLAIMS: &str = r#"{"file_name": "boot64.efi", "hash": "8ba6bc3d9ccfe9c17ad7482d6c0160150c7d1da4b4a4f464744ce069291d6174ea9949574002f022e18585df04f57c192431794f36f40659930bd5c0b470eb59", "version":"v2.1.0"}"#;

    #[test]
    fn test_check() {
        let r = UefiBinary.parse_requirements(br#"{"min_version": "v2.0.0"}"#).unwrap();
        let c = UefiBinary.parse_claims(CLAIMS.as_bytes()).unwrap();

        assert!(UefiBinary.check(r.as_ref(), c.as_ref()).is_ok());
    }

    #[test]
    fn test_check_version_too_old() {
        let r = UefiBinary
            .parse_requirements(br#"{"min_version": "v3.0.0", "architecture":"x64"}"#)
            .unwrap();
        let c = UefiBinary.parse_claims(CLAIMS.as_bytes()).unwrap();

        assert!(UefiBinary.check(r.as_ref(), c.as_ref()).is_err());
    }
}
