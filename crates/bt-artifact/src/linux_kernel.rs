//! LinuxKernel artifact category

use crate::common;
use crate::error::{Error, Result};
use crate::registry::{Handler, Opaque};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Supported policy requirements for a LinuxKernel artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    /// Required minimum version, using Semantic Versioning 2.0.0 (see semver.org)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub min_version: String,

    /// Maximum allowed version, using Semantic Versioning 2.0.0 (see semver.org)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub max_version: String,

    /// Allowed architecture; the vocabulary is the one defined by the EFI
    /// specification (IA32, x64, IA64, ARM, AA64, ...)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,

    /// True if tainted kernels are allowed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tainted: bool,

    /// List of allowed licenses, as SPDX short-form IDs where applicable
    /// (e.g. MIT, GPL-2.0-or-later, BSD-2-Clause)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub license: Vec<String>,

    /// Allow only artifacts whose claimed timestamp is more recent than this
    /// one, in RFC3339 format (e.g. "1985-04-12T23:20:50.52Z")
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub min_timestamp: String,

    /// Allow only artifacts claiming exactly this metadata
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metadata: String,

    /// Allow only artifacts whose claimed metadata includes all of these
    /// strings (AND of inclusion checks)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_include: Vec<String>,

    /// Allow only artifacts whose claimed metadata includes none of these
    /// strings (AND of negated inclusion checks)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_not_include: Vec<String>,
}

/// Supported claims for a LinuxKernel artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Filename of the artifact
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_name: String,

    /// SHA-512 hash of the artifact
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,

    /// Artifact version, using Semantic Versioning 2.0.0 (see semver.org)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Architecture, using the EFI specification vocabulary
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,

    /// True if the kernel is tainted
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tainted: bool,

    /// License(s) associated to this artifact, as SPDX short-form IDs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub license: Vec<String>,

    /// Timestamp in RFC3339 format; the claimant decides which timestamp of
    /// the artifact (release date, build time, ...) the boot policy verifies
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,

    /// Public URLs of the source code used to build the artifact
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_urls: Vec<String>,

    /// Arbitrary artifact information (build arguments, configuration flags,
    /// toolchain details, ...) matched by the metadata predicates
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metadata: String,
}

/// Handler for the LinuxKernel category
pub struct LinuxKernel;

impl Handler for LinuxKernel {
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
            .ok_or_else(|| Error::InvalidInput("invalid policy requirements for LinuxKernel".to_string()))?;
        let c = claims
            .downcast_ref::<Claims>()
            .ok_or_else(|| Error::InvalidInput("invalid claims for LinuxKernel".to_string()))?;

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
