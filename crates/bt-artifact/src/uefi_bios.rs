//! UEFIBIOS firmware artifact category
//!
//! Firmware claims are matched on the UEFI specification revision (semver),
//! the firmware vendor (allow-list) and the vendor firmware revision, a
//! 16-bit value exchanged in hex with an optional `0x` prefix.

use crate::common;
use crate::error::{Error, Result};
use crate::registry::{Handler, Opaque};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Supported policy requirements for a UEFIBIOS artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    /// Required minimum UEFI revision, using Semantic Versioning 2.0.0
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub min_uefi_revision: String,

    /// Maximum allowed UEFI revision, using Semantic Versioning 2.0.0
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub max_uefi_revision: String,

    /// Allow the boot only on systems whose BIOS comes from one of these vendors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub firmware_vendor: Vec<String>,

    /// Required minimum firmware revision, in hex format (e.g. 0x1560)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub min_firmware_revision: String,

    /// Maximum allowed firmware revision, in hex format (e.g. 0x1560)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub max_firmware_revision: String,
}

/// Supported claims for a UEFIBIOS artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    /// UEFI revision, using Semantic Versioning 2.0.0
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uefi_revision: String,

    /// Firmware vendor
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub firmware_vendor: String,

    /// Firmware revision, in hex format (e.g. 0x1560)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub firmware_revision: String,
}

/// Handler for the UEFIBIOS category
pub struct UefiBios;

/// Parse a 16-bit firmware revision in hex format, `0x` prefix optional
fn parse_firmware_revision(revision: &str) -> Option<u16> {
    let digits = revision.strip_prefix("0x").unwrap_or(revision);
    u16::from_str_radix(digits, 16).ok()
}

impl Handler for UefiBios {
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
            .ok_or_else(|| Error::InvalidInput("invalid policy requirements for UEFIBIOS".to_string()))?;
        let c = claims
            .downcast_ref::<Claims>()
            .ok_or_else(|| Error::InvalidInput("invalid claims for UEFIBIOS".to_string()))?;

        common::check_min_version(&r.min_uefi_revision, &c.uefi_revision)?;
        common::check_max_version(&r.max_uefi_revision, &c.uefi_revision)?;

        if !r.firmware_vendor.is_empty()
            && !common::element_inclusion(&r.firmware_vendor, &c.firmware_vendor)
        {
            return Err(Error::RequirementUnmet(format!(
                "firmware vendor {:?} does not meet requirements",
                c.firmware_vendor
            )));
        }

        if !r.min_firmware_revision.is_empty() {
            let require = parse_firmware_revision(&r.min_firmware_revision).ok_or_else(|| {
                Error::Parse(format!(
                    "invalid min firmware revision requirement: {:?}",
                    r.min_firmware_revision
                ))
            })?;
            let claim = parse_firmware_revision(&c.firmware_revision).ok_or_else(|| {
                Error::Parse(format!(
                    "invalid firmware revision claim: {:?}",
                    c.firmware_revision
                ))
            })?;

            if claim < require {
                return Err(Error::RequirementUnmet(format!(
                    "revision {:?} does not meet min firmware revision requirement",
                    c.firmware_revision
                )));
            }
        }

        if !r.max_firmware_revision.is_empty() {
            let require = parse_firmware_revision(&r.max_firmware_revision).ok_or_else(|| {
                Error::Parse(format!(
                    "invalid max firmware revision requirement: {:?}",
                    r.max_firmware_revision
                ))
            })?;
            let claim = parse_firmware_revision(&c.firmware_revision).ok_or_else(|| {
                Error::Parse(format!(
                    "invalid firmware revision claim: {:?}",
                    c.firmware_revision
                ))
            })?;

            if claim > require {
                return Err(Error::RequirementUnmet(format!(
                    "revision {:?} does not meet max firmware revision requirement",
                    c.firmware_revision
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIREMENTS: &str =
        r#"{"min_uefi_revision":"v2.7.0", "firmware_vendor":[ "Lenovo" ], "min_firmware_revision":"0x1560"}"#;

    #[test]
    fn test_parse_requirements() {
        assert!(UefiBios.parse_requirements(REQUIREMENTS.as_bytes()).is_ok());
    }

    #[test]
    fn test_parse_requirements_rejects_scalar_vendor() {
        let r = r#"{"min_uefi_revision":"v2.7.0", "firmware_vendor":"Lenovo"}"#;
        assert!(UefiBios.parse_requirements(r.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_claims_rejects_vendor_array() {
        let c = r#"{"uefi_revision":"v2.7.0", "firmware_vendor":[ "Lenovo" ]}"#;
        assert!(UefiBios.parse_claims(c.as_bytes()).is_err());
    }

    #[test]
    fn test_check() {
        let claims =
            r#"{"uefi_revision":"v2.7.0", "firmware_vendor":"Lenovo" , "firmware_revision":"0x1560"}"#;

        let r = UefiBios.parse_requirements(REQUIREMENTS.as_bytes()).unwrap();
        let c = UefiBios.parse_claims(claims.as_bytes()).unwrap();

        assert!(UefiBios.check(r.as_ref(), c.as_ref()).is_ok());
    }

    #[test]
    fn test_check_vendor_not_allowed() {
        let claims =
            r#"{"uefi_revision":"v2.7.0", "firmware_vendor":"Unknown", "firmware_revision":"0x1560"}"#;

        let r = UefiBios.parse_requirements(REQUIREMENTS.as_bytes()).unwrap();
        let c = UefiBios.parse_claims(claims.as_bytes()).unwrap();

        assert!(matches!(
            UefiBios.check(r.as_ref(), c.as_ref()),
            Err(Error::RequirementUnmet(_))
        ));
    }

    #[test]
    fn test_check_firmware_revision_too_old() {
        let claims =
            r#"{"uefi_revision":"v2.7.0", "firmware_vendor":"Lenovo", "firmware_revision":"0x1550"}"#;

        let r = UefiBios.parse_requirements(REQUIREMENTS.as_bytes()).unwrap();
        let c = UefiBios.parse_claims(claims.as_bytes()).unwrap();

        assert!(UefiBios.check(r.as_ref(), c.as_ref()).is_err());
    }

    #[test]
    fn test_empty_vendor_list_accepts_any_vendor() {
        let r = UefiBios.parse_requirements(b"{}").unwrap();
        let c = UefiBios
            .parse_claims(br#"{"firmware_vendor":"Unknown"}"#)
            .unwrap();

        assert!(UefiBios.check(r.as_ref(), c.as_ref()).is_ok());
    }
}
