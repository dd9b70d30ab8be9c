//! Probe data for requesting a Tessera inclusion proof

use serde::{Deserialize, Serialize};

/// The set of inputs required to probe a Tessera log for the inclusion
/// proof of a given leaf
///
/// The leaf hash is not carried: it is recomputed from the statement
/// included in the proof bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Probe {
    /// Log origin URL; `http(s)` and `file` schemes are supported
    pub origin: String,

    /// Leaf index
    #[serde(rename = "leafIdx")]
    pub leaf_idx: u64,

    /// Tree size the proof was built under
    #[serde(rename = "treeSize")]
    pub tree_size: u64,

    /// Root hash committed to by the log's checkpoint
    #[serde(with = "base64_hash")]
    pub root: [u8; 32],

    /// Log public key in note verifier format
    pub log_public_key: String,
}

/// Serde codec for a base64-encoded 32-byte hash
mod base64_hash {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = STANDARD
            .decode(&text)
            .map_err(serde::de::Error::custom)?;

        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("root hash is not 32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_round_trip() {
        let json = r#"{"origin":"https://log.example.org","leafIdx":42,"treeSize":100,"root":"uzTMCXORU4P578THD4xrb5W3TMYwRE+oMYLihfiU6QA=","log_public_key":"PeterNeumann+c74f20a3+ARpc2QcUPDhMQegwxbzhKqiBfsVkmqq/LDE4izWy10TW"}"#;

        let probe: Probe = serde_json::from_str(json).unwrap();
        assert_eq!(probe.leaf_idx, 42);
        assert_eq!(probe.tree_size, 100);
        assert_eq!(
            hex::encode(probe.root),
            "bb34cc0973915383f9efc4c70f8c6b6f95b74cc630444fa83182e285f894e900"
        );

        assert_eq!(serde_json::to_string(&probe).unwrap(), json);
    }

    #[test]
    fn test_probe_rejects_short_root() {
        let json = r#"{"origin":"o","leafIdx":0,"treeSize":1,"root":"uzTM","log_public_key":"k"}"#;
        assert!(serde_json::from_str::<Probe>(json).is_err());
    }
}
