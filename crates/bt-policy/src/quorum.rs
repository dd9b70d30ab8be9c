//! Signer quorum verification

use crate::error::{Error, Result};
use crate::policy::SigningRequirement;
use bt_crypto::{parse_public_key, verify_ed25519};
use bt_statement::Statement;

/// Check the statement's signatures against the required signing quorum
///
/// For each trusted signer of the requirement, the statement signatures are
/// walked until one verifies under the signer's key over the canonical
/// `artifacts` encoding. A signer contributing several valid signatures
/// counts once; signatures from signers outside the requirement never count.
pub fn check_signing_quorum(requirement: &SigningRequirement, statement: &Statement) -> Result<()> {
    let artifacts = statement.canonical_artifacts()?;

    let mut valid_signatures: u64 = 0;

    for signer in &requirement.signers {
        let key = parse_public_key(&signer.pub_key)?;

        let mut got_valid_signature = false;
        for entry in &statement.signatures {
            let signature = hex::decode(&entry.signature)?;

            if verify_ed25519(&key, &artifacts, &signature).is_ok() {
                got_valid_signature = true;
                break;
            }
        }

        if got_valid_signature {
            valid_signatures += 1;
        }
    }

    if valid_signatures < requirement.quorum {
        return Err(Error::QuorumUnsatisfied {
            valid: valid_signatures,
            quorum: requirement.quorum,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Signer;
    use bt_artifact::Registry;
    use bt_statement::SignatureEntry;

    const SIGNER_A: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAINBKsjJ0K7SrOhNovUYV5ObQIkq3GgFrr4UgozLJd4c3";
    const SIGNER_B: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIKCapfR6Z1mAL/lV+NwtKhSlyZ0jvpf4ZBJ/+Tg0VaTw";
    const SIGNER_C: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIKwmwKhVrEUaZTlHjhoWA4jwJLOF8TY+/NpHAXAHbAHl";

    fn signers(keys: &[&str]) -> Vec<Signer> {
        keys.iter()
            .map(|k| Signer {
                name: None,
                pub_key: k.to_string(),
            })
            .collect()
    }

    fn statement() -> Statement {
        let registry = Registry::with_builtin();
        Statement::parse(crate::policy::tests::STATEMENT.as_bytes(), &registry).unwrap()
    }

    #[test]
    fn test_quorum_of_two() {
        let requirement = SigningRequirement {
            signers: signers(&[SIGNER_A, SIGNER_B, SIGNER_C]),
            quorum: 2,
        };

        assert!(check_signing_quorum(&requirement, &statement()).is_ok());
    }

    #[test]
    fn test_quorum_missing_signature() {
        let requirement = SigningRequirement {
            signers: signers(&[SIGNER_A, SIGNER_B, SIGNER_C]),
            quorum: 2,
        };

        let mut statement = statement();
        statement.signatures.retain(|s| s.pub_key == SIGNER_A);

        assert!(matches!(
            check_signing_quorum(&requirement, &statement),
            Err(Error::QuorumUnsatisfied { valid: 1, quorum: 2 })
        ));
    }

    #[test]
    fn test_duplicate_signatures_count_once() {
        let requirement = SigningRequirement {
            signers: signers(&[SIGNER_A, SIGNER_B]),
            quorum: 2,
        };

        // duplicate A's signature and drop B's
        let mut statement = statement();
        let a: Vec<SignatureEntry> = statement
            .signatures
            .iter()
            .filter(|s| s.pub_key == SIGNER_A)
            .cloned()
            .collect();
        statement.signatures = vec![a[0].clone(), a[0].clone()];

        assert!(matches!(
            check_signing_quorum(&requirement, &statement),
            Err(Error::QuorumUnsatisfied { valid: 1, quorum: 2 })
        ));
    }

    #[test]
    fn test_untrusted_signatures_do_not_count() {
        let requirement = SigningRequirement {
            signers: signers(&[SIGNER_C]),
            quorum: 1,
        };

        assert!(matches!(
            check_signing_quorum(&requirement, &statement()),
            Err(Error::QuorumUnsatisfied { valid: 0, quorum: 1 })
        ));
    }
}
