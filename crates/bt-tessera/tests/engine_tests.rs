//! Tessera engine tests
//!
//! Builds a small log in memory (and on disk for the online path): leaves,
//! tiles, a checkpoint note signed by a freshly generated log key, and a
//! proof bundle carrying the statement at a chosen leaf index.

use aws_lc_rs::signature::{Ed25519KeyPair, KeyPair as _};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bt_crypto::{sha256, SigningKey};
use bt_merkle::{hash_children, hash_leaf, HASH_SIZE};
use bt_tessera::TesseraEngine;
use bt_transparency::{Error, TransparencyEngine, TESSERA};

const STATEMENT: &str = r#"{"description": "Linux bundle", "artifacts": [{"category": 1, "claims": {"version": "v6.14.0"}}]}"#;
const LOG_NAME: &str = "log.example.org";

struct TestLog {
    signer: SigningKey,
    vkey: String,
    leaves: Vec<[u8; HASH_SIZE]>,
}

fn range_root(row: &[[u8; HASH_SIZE]]) -> [u8; HASH_SIZE] {
    match row.len() {
        1 => row[0],
        n => {
            let k = (n.next_power_of_two() / 2).max(1);
            hash_children(&range_root(&row[..k]), &range_root(&row[k..]))
        }
    }
}

fn inclusion_path(row: &[[u8; HASH_SIZE]], index: usize) -> Vec<[u8; HASH_SIZE]> {
    if row.len() == 1 {
        return Vec::new();
    }
    let k = row.len().next_power_of_two() / 2;
    if index < k {
        let mut path = inclusion_path(&row[..k], index);
        path.push(range_root(&row[k..]));
        path
    } else {
        let mut path = inclusion_path(&row[k..], index - k);
        path.push(range_root(&row[..k]));
        path
    }
}

impl TestLog {
    /// A log of `size` leaves with the statement at `statement_index`
    fn new(size: usize, statement_index: usize) -> Self {
        let seed = [9u8; 32];
        let pair = Ed25519KeyPair::from_seed_unchecked(&seed).unwrap();
        let mut public = [0u8; 32];
        public.copy_from_slice(pair.public_key().as_ref());
        let signer = SigningKey::from_seed(&seed, &public).unwrap();

        let mut blob = vec![0x01u8];
        blob.extend_from_slice(&public);
        let mut id_input = LOG_NAME.as_bytes().to_vec();
        id_input.push(b'\n');
        id_input.extend_from_slice(&blob);
        let digest = sha256(&id_input);
        let key_id = &digest[..4];
        let vkey = format!("{}+{}+{}", LOG_NAME, hex::encode(key_id), STANDARD.encode(&blob));

        let leaves: Vec<[u8; HASH_SIZE]> = (0..size)
            .map(|i| {
                if i == statement_index {
                    hash_leaf(STATEMENT.as_bytes())
                } else {
                    hash_leaf(format!("leaf {}", i).as_bytes())
                }
            })
            .collect();

        Self {
            signer,
            vkey,
            leaves,
        }
    }

    fn root(&self) -> [u8; HASH_SIZE] {
        range_root(&self.leaves)
    }

    fn checkpoint(&self) -> String {
        let body = format!(
            "{}\n{}\n{}\n",
            LOG_NAME,
            self.leaves.len(),
            STANDARD.encode(self.root())
        );
        let signature = self.signer.sign(body.as_bytes());

        let mut id_input = LOG_NAME.as_bytes().to_vec();
        id_input.push(b'\n');
        id_input.push(0x01);
        id_input.extend_from_slice(&self.signer.public_key());
        let digest = sha256(&id_input);
        let key_id = &digest[..4];

        let mut value = key_id.to_vec();
        value.extend_from_slice(&signature);

        format!("{}\n\u{2014} {} {}\n", body, LOG_NAME, STANDARD.encode(value))
    }

    fn bundle(&self, statement_index: usize) -> Vec<u8> {
        let proof: Vec<String> = inclusion_path(&self.leaves, statement_index)
            .iter()
            .map(|n| STANDARD.encode(n))
            .collect();

        let probe = serde_json::json!({
            "origin": "https://log.example.org",
            "leafIdx": statement_index as u64,
            "treeSize": self.leaves.len() as u64,
            "root": STANDARD.encode(self.root()),
            "log_public_key": self.vkey,
        });

        format!(
            r#"{{"format": 2, "statement": {}, "probe": {}, "proof": {}, "checkpoint": {}}}"#,
            STATEMENT,
            probe,
            serde_json::to_string(&proof).unwrap(),
            serde_json::to_string(&self.checkpoint()).unwrap()
        )
        .into_bytes()
    }
}

fn engine_with_log_key(log: &TestLog) -> TesseraEngine {
    let mut engine = TesseraEngine::new();
    engine.set_keys(&[log.vkey.clone()], &[]).unwrap();
    engine
}

#[test]
fn test_set_keys_rejects_malformed_vkey() {
    let mut engine = TesseraEngine::new();
    // malformed verifier id: truncated hash segment
    let key = "PeterNeumann+c74f203+ARpc2QcUPDhMQegwxbzKqiBfsVkmqq/LDE4izWy10TW".to_string();

    assert!(engine.set_keys(&[key], &[]).is_err());
}

#[test]
fn test_verify_proof() {
    let log = TestLog::new(13, 5);
    let engine = engine_with_log_key(&log);

    let (bundle, _) = engine.parse_proof(&log.bundle(5)).unwrap();
    assert!(engine.verify_proof(bundle.as_ref()).is_ok());
}

#[test]
fn test_verify_proof_single_leaf_tree() {
    let log = TestLog::new(1, 0);
    let engine = engine_with_log_key(&log);

    let (bundle, _) = engine.parse_proof(&log.bundle(0)).unwrap();
    assert!(engine.verify_proof(bundle.as_ref()).is_ok());
}

#[test]
fn test_parse_proof_rejects_bad_base64() {
    let log = TestLog::new(4, 1);
    let engine = engine_with_log_key(&log);

    let mut bundle: serde_json::Value = serde_json::from_slice(&log.bundle(1)).unwrap();
    bundle["proof"][0] = serde_json::Value::String("not!!!base64***".to_string());

    let result = engine.parse_proof(serde_json::to_string(&bundle).unwrap().as_bytes());
    assert!(matches!(result, Err(Error::Parse(_))));
}

#[test]
fn test_verify_proof_requires_checkpoint() {
    let log = TestLog::new(8, 3);
    let engine = engine_with_log_key(&log);

    let mut bundle: serde_json::Value =
        serde_json::from_slice(&log.bundle(3)).unwrap();
    bundle.as_object_mut().unwrap().remove("checkpoint");

    let (view, _) = engine
        .parse_proof(serde_json::to_string(&bundle).unwrap().as_bytes())
        .unwrap();
    assert!(matches!(
        engine.verify_proof(view.as_ref()),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_verify_proof_rejects_untrusted_checkpoint() {
    let log = TestLog::new(8, 3);

    // trust a different key than the one that signed the checkpoint
    let mut engine = TesseraEngine::new();
    engine
        .set_keys(
            &["PeterNeumann+c74f20a3+ARpc2QcUPDhMQegwxbzhKqiBfsVkmqq/LDE4izWy10TW".to_string()],
            &[],
        )
        .unwrap();

    let (bundle, _) = engine.parse_proof(&log.bundle(3)).unwrap();
    assert!(matches!(
        engine.verify_proof(bundle.as_ref()),
        Err(Error::Crypto(_))
    ));
}

#[test]
fn test_verify_proof_rejects_tampered_root() {
    let log = TestLog::new(8, 3);
    let engine = engine_with_log_key(&log);

    // flip the probe root; the checkpoint no longer matches it
    let mut bundle: serde_json::Value = serde_json::from_slice(&log.bundle(3)).unwrap();
    let mut root = log.root();
    root[0] ^= 0x01;
    bundle["probe"]["root"] = serde_json::Value::String(STANDARD.encode(root));

    let (view, _) = engine
        .parse_proof(serde_json::to_string(&bundle).unwrap().as_bytes())
        .unwrap();
    assert!(matches!(
        engine.verify_proof(view.as_ref()),
        Err(Error::Crypto(_))
    ));
}

#[test]
fn test_verify_proof_rejects_tampered_statement() {
    let log = TestLog::new(8, 3);
    let engine = engine_with_log_key(&log);

    let bundle = String::from_utf8(log.bundle(3))
        .unwrap()
        .replace("Linux bundle", "Other bundle");

    let (view, _) = engine.parse_proof(bundle.as_bytes()).unwrap();
    assert!(matches!(
        engine.verify_proof(view.as_ref()),
        Err(Error::Crypto(_))
    ));
}

#[test]
fn test_parse_proof_rejects_wrong_format() {
    let log = TestLog::new(4, 0);
    let engine = engine_with_log_key(&log);

    let bundle = String::from_utf8(log.bundle(0))
        .unwrap()
        .replace(r#""format": 2"#, r#""format": 1"#);

    assert!(matches!(
        engine.parse_proof(bundle.as_bytes()),
        Err(Error::EngineMismatch {
            found: 1,
            expected: TESSERA
        })
    ));
}

#[test]
fn test_parse_proof_round_trip() {
    let log = TestLog::new(8, 3);
    let engine = engine_with_log_key(&log);

    let (_, normalized) = engine.parse_proof(&log.bundle(3)).unwrap();
    let (_, renormalized) = engine.parse_proof(&normalized).unwrap();

    assert_eq!(normalized, renormalized);
}

#[tokio::test]
async fn test_get_proof_from_file_log() {
    let size = 300;
    let statement_index = 257;
    let log = TestLog::new(size, statement_index);

    // mirror the log under a temporary prefix: checkpoint plus level tiles
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("checkpoint"), log.checkpoint()).unwrap();

    // level 0: one full tile and a partial tile of width 44
    let tile0 = dir.path().join("tile/0");
    std::fs::create_dir_all(tile0.join("001.p")).unwrap();
    let full: Vec<u8> = log.leaves[..256].iter().flatten().copied().collect();
    std::fs::write(tile0.join("000"), full).unwrap();
    let partial: Vec<u8> = log.leaves[256..].iter().flatten().copied().collect();
    std::fs::write(tile0.join("001.p/44"), partial).unwrap();

    // level 1: a single complete node, stored as a partial tile of width 1
    let row1: Vec<[u8; HASH_SIZE]> = log
        .leaves
        .chunks(256)
        .filter(|c| c.len() == 256)
        .map(range_root)
        .collect();
    let tile1 = dir.path().join("tile/1");
    std::fs::create_dir_all(tile1.join("000.p")).unwrap();
    let flat: Vec<u8> = row1.iter().flatten().copied().collect();
    std::fs::write(tile1.join("000.p/1"), flat).unwrap();

    let mut engine = engine_with_log_key(&log);
    let policy = engine.parse_witness_policy(b"quorum none\n").unwrap();
    engine.set_witness_policy(policy).unwrap();

    let mut bundle: serde_json::Value = serde_json::from_slice(&log.bundle(statement_index)).unwrap();
    bundle["probe"]["origin"] =
        serde_json::Value::String(format!("file://{}", dir.path().display()));
    bundle.as_object_mut().unwrap().remove("proof");

    let (view, _) = engine
        .parse_proof(serde_json::to_string(&bundle).unwrap().as_bytes())
        .unwrap();

    let proof = engine.get_proof(view.as_ref()).await.unwrap();
    let nodes: Vec<String> = serde_json::from_slice(&proof).unwrap();

    let expected: Vec<String> = inclusion_path(&log.leaves, statement_index)
        .iter()
        .map(|n| STANDARD.encode(n))
        .collect();
    assert_eq!(nodes, expected);
}
