//! Policy model, parsing and checking

use crate::error::{Error, Result};
use crate::quorum::check_signing_quorum;
use bt_artifact::{CategoryId, Registry};
use bt_statement::Statement;
use serde::{Deserialize, Serialize};

/// A trusted signer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signer {
    /// Human-readable signer name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Signer's public key in OpenSSH format
    pub pub_key: String,
}

/// A signing quorum that must be satisfied to authorize the bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningRequirement {
    /// Trusted signers participating in the quorum
    pub signers: Vec<Signer>,

    /// Require at least this many distinct valid signers
    pub quorum: u64,
}

/// The required set of properties to authorize an artifact of one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRequirement {
    /// Artifact category (e.g. LinuxKernel, Initrd, Dtb, ...)
    pub category: CategoryId,

    /// Requirements that must match the claims of an artifact of this
    /// category, kept as raw JSON; the supported set depends on the category
    pub requirements: serde_json::Value,
}

/// One policy entry: a set of requirements authorizing a bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyEntry {
    /// Artifact rules (conjunction)
    pub artifacts: Vec<ArtifactRequirement>,

    /// Optional signing quorum for the bundle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<SigningRequirement>,
}

/// An ordered list of policy entries (disjunction)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy {
    pub entries: Vec<PolicyEntry>,
}

impl Policy {
    /// Parse the boot policy from its serialized JSON
    ///
    /// Each entry is deep-parsed: every artifact requirement must name a
    /// registered category and decode under its handler. Unknown top-level
    /// fields are ignored.
    pub fn parse(json: &[u8], registry: &Registry) -> Result<Self> {
        let policy: Policy = serde_json::from_slice(json)?;

        for entry in &policy.entries {
            for requirement in &entry.artifacts {
                let handler = registry.handler(requirement.category)?;
                let raw = serde_json::to_vec(&requirement.requirements)?;
                handler.parse_requirements(&raw)?;
            }
        }

        Ok(policy)
    }
}

/// Check whether the claims of a statement satisfy the policy
///
/// The entries are tried in declared order; the first entry that authorizes
/// the bundle wins. Within an entry the signing quorum is checked first,
/// then each artifact requirement must be matched by at least one statement
/// artifact of the same category. The error returned on rejection is the
/// last failure encountered during the scan.
pub fn check(policy: &Policy, statement: &Statement, registry: &Registry) -> Result<()> {
    let mut last_err: Option<Error> = None;

    for (index, entry) in policy.entries.iter().enumerate() {
        if let Some(requirement) = &entry.signatures {
            if requirement.quorum > 0 {
                if let Err(e) = check_signing_quorum(requirement, statement) {
                    tracing::debug!(entry = index, error = %e, "policy entry rejected");
                    // quorum not satisfied, try the next policy entry
                    last_err = Some(e);
                    continue;
                }
            }
        }

        match check_entry(entry, statement, registry) {
            Ok(()) => {
                tracing::debug!(entry = index, "policy entry authorizes the bundle");
                return Ok(());
            }
            // a handler miss or a claims decoding failure cannot be
            // recovered by later entries
            Err(e @ Error::Artifact(bt_artifact::Error::UnknownCategory(_))) => return Err(e),
            Err(e @ Error::Json(_)) => return Err(e),
            Err(e) => {
                tracing::debug!(entry = index, error = %e, "policy entry rejected");
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or(Error::PolicyUnsatisfied))
}

/// Check all artifact requirements of one entry against the statement
fn check_entry(entry: &PolicyEntry, statement: &Statement, registry: &Registry) -> Result<()> {
    for requirement in &entry.artifacts {
        let handler = registry.handler(requirement.category)?;

        let mut matched = false;
        let mut mismatch: Option<Error> = None;

        for artifact in &statement.artifacts {
            if artifact.category != requirement.category {
                continue;
            }

            let r = handler.parse_requirements(&serde_json::to_vec(&requirement.requirements)?)?;
            let c = handler.parse_claims(&serde_json::to_vec(&artifact.claims)?)?;

            match handler.check(r.as_ref(), c.as_ref()) {
                Ok(()) => {
                    // the first statement artifact satisfying the
                    // requirement wins
                    matched = true;
                    break;
                }
                Err(e) => mismatch = Some(e.into()),
            }
        }

        if !matched {
            // bundles missing an artifact compatible with this entry cannot
            // be authorized by it
            return Err(mismatch.unwrap_or(Error::MissingCategory(requirement.category)));
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const STATEMENT: &str = r#"{
    "description": "Linux bundle",
    "version": "v1",
    "artifacts": [
        {
            "category": 1,
            "claims": {
                "file_name": "vmlinuz-6.14.0-29-generic",
                "hash": "8ba6bc3d9ccfe9c17ad7482d6c0160150c7d1da4b4a4f464744ce069291d6174ea9949574002f022e18585df04f57c192431794f36f40659930bd5c0b470eb59",
                "version": "v6.14.0-29-generic",
                "architecture": "x64",
                "tainted": false,
                "license": ["GPL-2.0"]
            }
        },
        {
            "category": 2,
            "claims": {
                "file_name": "initrd.img-6.14.0-29-generic",
                "hash": "9f5db8bc106c426a6654aa53ada75db307adb6dcb59291aa0a874898bc197b3dad8d2ebef985936bba94e9ae34b52a79e8f9045346cde2326baf4feba73ab66c",
                "architecture": "x64",
                "tainted": false
            }
        }
    ],
    "signatures": [
        {
            "pub_key":"ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAINBKsjJ0K7SrOhNovUYV5ObQIkq3GgFrr4UgozLJd4c3",
            "signature":"d5231f684af6067581e2e14e0a91d8338d2a7d8c6efe42a6b467bf18ba5a6977b8a935d8937c2ae899b2386b27492634144f2b14d05b66c13fd44e15cde03e09"
        },
        {
            "pub_key":"ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIKCapfR6Z1mAL/lV+NwtKhSlyZ0jvpf4ZBJ/+Tg0VaTw",
            "signature":"03d56a5f279d1dfdf078eafeff243e3caef46938591f39272839d87bc98374bd463bf37e702e820c37e6bc0cece1f31bd3dccd739aa61fac2ca3b93570c6450f"
        }
    ]
}"#;

    const POLICY: &str = r#"[
{
    "artifacts": [
        {
            "category": 1,
            "requirements": {
                "min_version": "v6.14.0-29",
                "tainted": false,
                "architecture": "x64",
                "license":["GPL-2.0"]
            }
        },
        {
            "category": 2,
            "requirements": {
                "architecture": "x64",
                "tainted": false
            }
        }
    ],
    "signatures": {
        "signers": [
            {
                "name": "signatory I",
                "pub_key": "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAINBKsjJ0K7SrOhNovUYV5ObQIkq3GgFrr4UgozLJd4c3"
            },
            {
                "name": "signatory II",
                "pub_key": "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIKCapfR6Z1mAL/lV+NwtKhSlyZ0jvpf4ZBJ/+Tg0VaTw"
            }
        ],
        "quorum": 2
    }
},
{
    "artifacts": [
        {
            "category": 1,
            "requirements": {
                "min_version": "v6.14.0-29",
                "architecture": "x64"
            }
        }
    ]
}]"#;

    fn fixture() -> (Policy, Statement, Registry) {
        let registry = Registry::with_builtin();
        let policy = Policy::parse(POLICY.as_bytes(), &registry).unwrap();
        let statement = Statement::parse(STATEMENT.as_bytes(), &registry).unwrap();
        (policy, statement, registry)
    }

    #[test]
    fn test_parse() {
        let registry = Registry::with_builtin();
        let policy = Policy::parse(POLICY.as_bytes(), &registry).unwrap();

        assert_eq!(policy.entries.len(), 2);
        assert_eq!(policy.entries[0].artifacts.len(), 2);
        assert_eq!(policy.entries[0].signatures.as_ref().unwrap().quorum, 2);
    }

    #[test]
    fn test_parse_rejects_unknown_category() {
        let registry = Registry::with_builtin();
        let policy = r#"[{"artifacts": [{"category": 9, "requirements": {}}]}]"#;

        assert!(Policy::parse(policy.as_bytes(), &registry).is_err());
    }

    #[test]
    fn test_check() {
        let (policy, statement, registry) = fixture();
        assert!(check(&policy, &statement, &registry).is_ok());
    }

    #[test]
    fn test_check_falls_back_to_unsigned_entry() {
        let (policy, mut statement, registry) = fixture();

        // without signatures the first entry's quorum fails, the second
        // entry still authorizes the bundle
        statement.signatures.clear();
        assert!(check(&policy, &statement, &registry).is_ok());
    }

    #[test]
    fn test_check_reports_last_failure() {
        let (mut policy, mut statement, registry) = fixture();

        statement.signatures.clear();
        policy.entries.truncate(1);

        assert!(matches!(
            check(&policy, &statement, &registry),
            Err(Error::QuorumUnsatisfied { .. })
        ));
    }

    #[test]
    fn test_check_missing_category() {
        let (mut policy, mut statement, registry) = fixture();

        // keep only the unsigned entry and strip the kernel artifact
        policy.entries.remove(0);
        statement.artifacts.retain(|a| a.category != 1);

        assert!(matches!(
            check(&policy, &statement, &registry),
            Err(Error::MissingCategory(1))
        ));
    }

    #[test]
    fn test_check_tries_every_artifact_of_the_category() {
        let registry = Registry::with_builtin();

        // two kernel artifacts; only the second one satisfies the policy
        let statement = r#"{
            "artifacts": [
                {"category": 1, "claims": {"version": "v6.13.0", "architecture": "x64"}},
                {"category": 1, "claims": {"version": "v6.14.0", "architecture": "x64"}}
            ]
        }"#;
        let policy = r#"[{"artifacts": [{"category": 1, "requirements": {"min_version": "v6.14.0"}}]}]"#;

        let statement = Statement::parse(statement.as_bytes(), &registry).unwrap();
        let policy = Policy::parse(policy.as_bytes(), &registry).unwrap();

        assert!(check(&policy, &statement, &registry).is_ok());
    }

    #[test]
    fn test_check_empty_policy() {
        let (_, statement, registry) = fixture();
        let policy = Policy { entries: vec![] };

        assert!(matches!(
            check(&policy, &statement, &registry),
            Err(Error::PolicyUnsatisfied)
        ));
    }
}
