//! Initrd artifact category

use crate::common;
use crate::error::{Error, Result};
use crate::registry::{Handler, Opaque};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Supported policy requirements for an Initrd artifact
///
/// The `tainted` field allows init ram disks containing tainted kernel
/// modules; the remaining fields mirror the other boot categories.
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

/// Supported claims for an Initrd artifact
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

/// Handler for the Initrd category
pub struct Initrd;

impl Handler for Initrd {
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
            .ok_or_else(|| Error::InvalidInput("invalid policy requirements for Initrd".to_string()))?;
        let c = claims
            .downcast_ref::<Claims>()
            .ok_or_else(|| Error::InvalidInput("invalid claims for Initrd".to_string()))?;

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

    #[test]
    fn test_check() {
        let r = Initrd
            .parse_requirements(br#"{"architecture": "x64", "tainted": false}"#)
            .unwrap();
        let c = Initrd
            .parse_claims(br#"{"file_name": "initrd.img-6.14.0-29-generic", "hash": "9f5db8bc106c426a6654aa53ada75db307adb6dcb59291aa0a874898bc197b3dad8d2ebef985936bba94e9ae34b52a79e8f9045346cde2326baf4feba73ab66c", "architecture": "x64", "tainted": false}"#)
            .unwrap();

        assert!(Initrd.check(r.as_ref(), c.as_ref()).is_ok());
    }

    #[test]
    fn test_check_architecture_mismatch() {
        let r = Initrd.parse_requirements(br#"{"architecture": "AA64"}"#).unwrap();
        let c = Initrd.parse_claims(br#"{"architecture": "x64"}"#).unwrap();

        assert!(Initrd.check(r.as_ref(), c.as_ref()).is_err());
    }

    #[test]
    fn test_metadata_include() {
        let r = Initrd
            .parse_requirements(br#"{"metadata_include": ["dracut", "6.14.0-29"]}"#)
            .unwrap();
        let c = Initrd
            .parse_claims(br#"{"metadata": "/usr/bin/dracut --kver 6.14.0-29-generic"}"#)
            .unwrap();

        assert!(Initrd.check(r.as_ref(), c.as_ref()).is_ok());
    }
}
