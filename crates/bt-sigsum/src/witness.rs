//! Sigsum witness policy
//!
//! A mini-config of `log`, `witness`, `group` and `quorum` directives. The
//! quorum names a witness or group; groups combine members with `any`, `all`
//! or a numeric threshold and may nest. `quorum none` disables cosignature
//! checking.
//!
//! ```text
//! log 4644af2a... https://test.sigsum.org/barreleye
//!
//! witness W1 1c25f8a4...
//! witness W2 28c92a5a...
//!
//! group  demo-quorum-rule any W1 W2
//! quorum demo-quorum-rule
//! ```

use crate::proof::CosignedTreeHead;
use bt_crypto::sha256;
use bt_transparency::{Error, Result};
use std::collections::{HashMap, HashSet};

/// A group member threshold
#[derive(Debug, Clone, PartialEq)]
enum Threshold {
    Any,
    All,
    Count(usize),
}

/// A named group of witnesses and sub-groups
#[derive(Debug, Clone)]
struct Group {
    threshold: Threshold,
    members: Vec<String>,
}

/// The quorum named by the config
#[derive(Debug, Clone, PartialEq)]
enum Quorum {
    /// `quorum none`: no cosignature requirement
    None,
    /// A witness or group name
    Named(String),
}

/// A parsed witness policy
#[derive(Debug, Clone)]
pub struct WitnessPolicy {
    /// Log public keys listed in the config
    logs: Vec<[u8; 32]>,

    /// Witness public keys by name
    witnesses: HashMap<String, [u8; 32]>,

    /// Groups by name
    groups: HashMap<String, Group>,

    quorum: Quorum,
}

impl WitnessPolicy {
    /// Parse a witness policy config
    ///
    /// `#` starts a comment; blank lines are ignored. Witness and group
    /// names share one namespace and members must be defined before the
    /// group that uses them. Exactly one `quorum` directive is required.
    pub fn parse(config: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(config)
            .map_err(|_| Error::Parse("witness policy is not valid UTF-8".to_string()))?;

        let mut logs = Vec::new();
        let mut witnesses: HashMap<String, [u8; 32]> = HashMap::new();
        let mut groups: HashMap<String, Group> = HashMap::new();
        let mut quorum: Option<Quorum> = None;

        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields[0] {
                "log" => {
                    if fields.len() < 2 {
                        return Err(Error::Parse("malformed log directive".to_string()));
                    }
                    logs.push(decode_key(fields[1])?);
                }
                "witness" => {
                    if fields.len() < 3 {
                        return Err(Error::Parse("malformed witness directive".to_string()));
                    }
                    let name = fields[1].to_string();
                    if witnesses.contains_key(&name) || groups.contains_key(&name) {
                        return Err(Error::Parse(format!("duplicate name {:?}", name)));
                    }
                    witnesses.insert(name, decode_key(fields[2])?);
                }
                "group" => {
                    if fields.len() < 4 {
                        return Err(Error::Parse("malformed group directive".to_string()));
                    }
                    let name = fields[1].to_string();
                    if witnesses.contains_key(&name) || groups.contains_key(&name) {
                        return Err(Error::Parse(format!("duplicate name {:?}", name)));
                    }

                    let threshold = match fields[2] {
                        "any" => Threshold::Any,
                        "all" => Threshold::All,
                        n => Threshold::Count(n.parse().map_err(|_| {
                            Error::Parse(format!("invalid group threshold {:?}", n))
                        })?),
                    };

                    let members: Vec<String> = fields[3..].iter().map(|m| m.to_string()).collect();
                    for member in &members {
                        if !witnesses.contains_key(member) && !groups.contains_key(member) {
                            return Err(Error::Parse(format!(
                                "undefined group member {:?}",
                                member
                            )));
                        }
                    }
                    if let Threshold::Count(n) = threshold {
                        if n == 0 || n > members.len() {
                            return Err(Error::Parse(format!(
                                "group threshold {} out of range for {} members",
                                n,
                                members.len()
                            )));
                        }
                    }

                    groups.insert(name, Group { threshold, members });
                }
                "quorum" => {
                    if fields.len() != 2 {
                        return Err(Error::Parse("malformed quorum directive".to_string()));
                    }
                    if quorum.is_some() {
                        return Err(Error::Parse("duplicate quorum directive".to_string()));
                    }
                    quorum = Some(match fields[1] {
                        "none" => Quorum::None,
                        name => {
                            if !witnesses.contains_key(name) && !groups.contains_key(name) {
                                return Err(Error::Parse(format!(
                                    "quorum names undefined {:?}",
                                    name
                                )));
                            }
                            Quorum::Named(name.to_string())
                        }
                    });
                }
                directive => {
                    return Err(Error::Parse(format!(
                        "unknown directive {:?}",
                        directive
                    )));
                }
            }
        }

        let quorum =
            quorum.ok_or_else(|| Error::Parse("missing quorum directive".to_string()))?;

        Ok(Self {
            logs,
            witnesses,
            groups,
            quorum,
        })
    }

    /// Verify a cosigned tree head against this policy
    ///
    /// The log key hash must belong to a log listed in the config; the
    /// cosignatures must satisfy the quorum.
    pub fn verify_cosigned_tree_head(
        &self,
        log_key_hash: &[u8; 32],
        cosigned: &CosignedTreeHead,
    ) -> Result<()> {
        if !self.logs.iter().any(|k| sha256(k) == *log_key_hash) {
            return Err(Error::Crypto("unknown log key hash".to_string()));
        }

        let name = match &self.quorum {
            Quorum::None => return Ok(()),
            Quorum::Named(name) => name,
        };

        // collect the witnesses with a valid cosignature on this tree head
        let mut valid: HashSet<&str> = HashSet::new();
        for (witness, key) in &self.witnesses {
            let key_hash = sha256(key);

            let cosignature = cosigned
                .cosignatures
                .iter()
                .find(|cs| cs.key_hash == key_hash);

            if let Some(cs) = cosignature {
                if cs.verify(key, log_key_hash, &cosigned.tree_head).is_ok() {
                    valid.insert(witness.as_str());
                } else {
                    tracing::warn!(%witness, "invalid cosignature");
                }
            }
        }

        if self.satisfied(name, &valid) {
            Ok(())
        } else {
            Err(Error::WitnessPolicyUnsatisfied(format!(
                "cosignature quorum {:?} not reached",
                name
            )))
        }
    }

    /// Whether a named witness or group is satisfied by the valid set
    fn satisfied(&self, name: &str, valid: &HashSet<&str>) -> bool {
        if self.witnesses.contains_key(name) {
            return valid.contains(name);
        }

        match self.groups.get(name) {
            Some(group) => {
                let count = group
                    .members
                    .iter()
                    .filter(|m| self.satisfied(m, valid))
                    .count();

                match group.threshold {
                    Threshold::Any => count >= 1,
                    Threshold::All => count == group.members.len(),
                    Threshold::Count(n) => count >= n,
                }
            }
            None => false,
        }
    }
}

/// Decode a 32-byte hex public key
fn decode_key(field: &str) -> Result<[u8; 32]> {
    let bytes =
        hex::decode(field).map_err(|e| Error::Parse(format!("invalid public key: {}", e)))?;

    bytes
        .try_into()
        .map_err(|_| Error::Parse(format!("invalid public key length: {:?}", field)))
}
