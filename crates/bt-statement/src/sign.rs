//! Statement signing and signature verification
//!
//! Only the `artifacts` section of the statement is signed, so signatures
//! can be appended incrementally without invalidating existing ones.

use crate::error::{Error, Result};
use crate::statement::{SignatureEntry, Statement};
use bt_crypto::{encode_public_key, parse_public_key, verify_ed25519, SigningKey};

/// Append an Ed25519 signature over the statement's artifacts
///
/// The signer's public key is recorded alongside the signature in OpenSSH
/// format. Existing signatures are kept.
pub fn sign(statement: &mut Statement, key: &SigningKey) -> Result<()> {
    let artifacts = statement.canonical_artifacts()?;
    let signature = key.sign(&artifacts);

    statement.signatures.push(SignatureEntry {
        pub_key: encode_public_key(&key.public_key()),
        signature: hex::encode(signature),
    });

    Ok(())
}

/// Verify that some statement signature is valid under the given public key
///
/// The statement can carry multiple signatures; the first one that verifies
/// over the canonical `artifacts` encoding succeeds. Malformed signature
/// encodings are a hard error.
pub fn verify_signature(statement: &Statement, public_key: &str) -> Result<()> {
    let key = parse_public_key(public_key)?;
    let artifacts = statement.canonical_artifacts()?;

    for entry in &statement.signatures {
        let signature = hex::decode(&entry.signature)?;

        if verify_ed25519(&key, &artifacts, &signature).is_ok() {
            return Ok(());
        }
    }

    Err(Error::SignatureInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_artifact::Registry;
    use bt_crypto::ed25519::PUBLIC_KEY_SIZE;

    // the statement fixture carries signatures from these two signers
    const SIGNER_A: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAINBKsjJ0K7SrOhNovUYV5ObQIkq3GgFrr4UgozLJd4c3";
    const SIGNER_B: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIKCapfR6Z1mAL/lV+NwtKhSlyZ0jvpf4ZBJ/+Tg0VaTw";
    const OTHER: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIKwmwKhVrEUaZTlHjhoWA4jwJLOF8TY+/NpHAXAHbAHl";

    fn fixture() -> Statement {
        let registry = Registry::with_builtin();
        Statement::parse(crate::statement::tests::STATEMENT.as_bytes(), &registry).unwrap()
    }

    #[test]
    fn test_verify_fixture_signatures() {
        let statement = fixture();

        assert!(verify_signature(&statement, SIGNER_A).is_ok());
        assert!(verify_signature(&statement, SIGNER_B).is_ok());
    }

    #[test]
    fn test_verify_rejects_unrelated_key() {
        let statement = fixture();

        assert!(matches!(
            verify_signature(&statement, OTHER),
            Err(Error::SignatureInvalid)
        ));
    }

    #[test]
    fn test_sign_appends() {
        let mut statement = fixture();
        let seed = [3u8; 32];
        let pair = aws_lc_rs::signature::Ed25519KeyPair::from_seed_unchecked(&seed).unwrap();
        use aws_lc_rs::signature::KeyPair as _;
        let mut public = [0u8; PUBLIC_KEY_SIZE];
        public.copy_from_slice(pair.public_key().as_ref());
        let key = SigningKey::from_seed(&seed, &public).unwrap();

        sign(&mut statement, &key).unwrap();

        assert_eq!(statement.signatures.len(), 3);
        let encoded = encode_public_key(&key.public_key());
        assert_eq!(statement.signatures[2].pub_key, encoded);
        assert!(verify_signature(&statement, &encoded).is_ok());

        // the original signatures still verify
        assert!(verify_signature(&statement, SIGNER_A).is_ok());
    }
}
