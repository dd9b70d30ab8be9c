//! Predicates shared by the artifact category handlers
//!
//! Every predicate accepts an empty requirement: a field the policy does not
//! set means "don't care". Handlers sequence these predicates and return at
//! the first failure.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use semver::Version;
use subtle::ConstantTimeEq;

/// SHA-512 digest size in bytes
const SHA512_SIZE: usize = 64;

/// Compare the claimed file hash against the required one
///
/// Both values must hex-decode to a full SHA-512 digest. The comparison is
/// constant-time.
pub fn check_hash(require_hash: &str, claim_hash: &str) -> Result<()> {
    if require_hash.is_empty() {
        return Ok(());
    }

    let r = hex::decode(require_hash)
        .map_err(|e| Error::Parse(format!("invalid hash requirement: {}", e)))?;
    let c = hex::decode(claim_hash)
        .map_err(|e| Error::Parse(format!("invalid hash claim: {}", e)))?;

    if r.len() != SHA512_SIZE {
        return Err(Error::Parse(format!(
            "invalid requirement hash length: {:?}",
            require_hash
        )));
    }
    if c.len() != SHA512_SIZE {
        return Err(Error::Parse(format!(
            "invalid claim hash length: {:?}",
            claim_hash
        )));
    }

    if r.ct_eq(&c).unwrap_u8() != 1 {
        return Err(Error::RequirementUnmet(format!(
            "hash {:?} does not meet requirements",
            claim_hash
        )));
    }

    Ok(())
}

/// Parse a semantic version, permitting the customary leading `v`
pub fn parse_version(version: &str) -> Result<Version> {
    Version::parse(version.strip_prefix('v').unwrap_or(version))
        .map_err(|e| Error::Parse(format!("invalid version {:?}: {}", version, e)))
}

/// Check the minimum version requirement against the claimed version
pub fn check_min_version(require_version: &str, claim_version: &str) -> Result<()> {
    if require_version.is_empty() {
        return Ok(());
    }

    let r = parse_version(require_version)
        .map_err(|_| Error::Parse(format!("invalid min version requirement: {:?}", require_version)))?;
    let c = parse_version(claim_version)
        .map_err(|_| Error::Parse(format!("invalid version claim: {:?}", claim_version)))?;

    if c < r {
        return Err(Error::RequirementUnmet(format!(
            "version {:?} does not meet min version requirement",
            claim_version
        )));
    }

    Ok(())
}

/// Check the maximum version requirement against the claimed version
pub fn check_max_version(require_version: &str, claim_version: &str) -> Result<()> {
    if require_version.is_empty() {
        return Ok(());
    }

    let r = parse_version(require_version)
        .map_err(|_| Error::Parse(format!("invalid max version requirement: {:?}", require_version)))?;
    let c = parse_version(claim_version)
        .map_err(|_| Error::Parse(format!("invalid version claim: {:?}", claim_version)))?;

    if c > r {
        return Err(Error::RequirementUnmet(format!(
            "version {:?} does not meet max version requirement",
            claim_version
        )));
    }

    Ok(())
}

/// Check that every claimed string appears in the required allow-list
pub fn check_array_inclusion(require: &[String], claim: &[String]) -> Result<()> {
    if require.is_empty() {
        return Ok(());
    }

    for c in claim {
        if !element_inclusion(require, c) {
            return Err(Error::RequirementUnmet(format!("{:?} not allowed", c)));
        }
    }

    Ok(())
}

/// Check the inclusion of a single string within an array of allowed ones
pub fn element_inclusion(slice: &[String], element: &str) -> bool {
    slice.iter().any(|v| v == element)
}

/// Check the claimed timestamp against the minimum timestamp requirement
pub fn check_min_timestamp(require_min: &str, claim: &str) -> Result<()> {
    if require_min.is_empty() {
        return Ok(());
    }

    let r: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(require_min)
        .map_err(|_| Error::Parse(format!("invalid min timestamp requirement: {:?}", require_min)))?;
    let c: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(claim)
        .map_err(|_| Error::Parse(format!("invalid timestamp claim: {:?}", claim)))?;

    if r > c {
        return Err(Error::RequirementUnmet(format!(
            "timestamp {:?} does not meet min timestamp requirement",
            claim
        )));
    }

    Ok(())
}

/// Check exact string equality
pub fn check_string_match(require: &str, claim: &str) -> Result<()> {
    if require.is_empty() {
        return Ok(());
    }

    if require != claim {
        return Err(Error::RequirementUnmet(
            "claimed string does not match requirement".to_string(),
        ));
    }

    Ok(())
}

/// Check that the claimed string contains the required substring
pub fn check_string_include(require: &str, claim: &str) -> Result<()> {
    if require.is_empty() {
        return Ok(());
    }

    if !claim.contains(require) {
        return Err(Error::RequirementUnmet(
            "claimed string does not include the requirement".to_string(),
        ));
    }

    Ok(())
}

/// Check that the claimed string does not contain the forbidden substring
pub fn check_string_not_include(require: &str, claim: &str) -> Result<()> {
    if require.is_empty() {
        return Ok(());
    }

    if claim.contains(require) {
        return Err(Error::RequirementUnmet(
            "claimed string includes the forbidden requirement".to_string(),
        ));
    }

    Ok(())
}
