//! Tessera witness group policy
//!
//! Witness keys are note verifier keys; witnesses countersign the log's
//! checkpoint with note signature lines. The policy combines witnesses into
//! nested groups with `any`, `all` or numeric thresholds, and a `quorum`
//! directive names the group that must be satisfied.
//!
//! ```text
//! witness W1 witness1.example.org+67890abc+AR...
//! witness W2 witness2.example.org+13579def+AR...
//!
//! group  trusted-witnesses 1 W1 W2
//! quorum trusted-witnesses
//! ```

use bt_crypto::{NoteVerifier, SignedNote};
use bt_transparency::{Error, Result};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
enum Threshold {
    Any,
    All,
    Count(usize),
}

#[derive(Debug, Clone)]
struct Group {
    threshold: Threshold,
    members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Quorum {
    None,
    Named(String),
}

/// A parsed witness group policy
#[derive(Debug, Clone)]
pub struct WitnessGroup {
    witnesses: HashMap<String, NoteVerifier>,
    groups: HashMap<String, Group>,
    quorum: Quorum,
}

impl WitnessGroup {
    /// Parse a witness group policy
    ///
    /// `#` starts a comment. Witness and group names share one namespace and
    /// group members must be defined before use. Exactly one `quorum`
    /// directive is required; `quorum none` disables the check.
    pub fn parse(config: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(config)
            .map_err(|_| Error::Parse("witness policy is not valid UTF-8".to_string()))?;

        let mut witnesses: HashMap<String, NoteVerifier> = HashMap::new();
        let mut groups: HashMap<String, Group> = HashMap::new();
        let mut quorum: Option<Quorum> = None;

        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields[0] {
                "witness" => {
                    if fields.len() != 3 {
                        return Err(Error::Parse("malformed witness directive".to_string()));
                    }
                    let name = fields[1].to_string();
                    if witnesses.contains_key(&name) || groups.contains_key(&name) {
                        return Err(Error::Parse(format!("duplicate name {:?}", name)));
                    }

                    let verifier = NoteVerifier::parse(fields[2])
                        .map_err(|e| Error::Parse(e.to_string()))?;
                    witnesses.insert(name, verifier);
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
                    return Err(Error::Parse(format!("unknown directive {:?}", directive)));
                }
            }
        }

        let quorum =
            quorum.ok_or_else(|| Error::Parse("missing quorum directive".to_string()))?;

        Ok(Self {
            witnesses,
            groups,
            quorum,
        })
    }

    /// Check that the checkpoint's cosignatures satisfy the quorum
    pub fn satisfied(&self, note: &SignedNote) -> Result<()> {
        let name = match &self.quorum {
            Quorum::None => return Ok(()),
            Quorum::Named(name) => name,
        };

        let mut valid: HashSet<&str> = HashSet::new();
        for (witness, verifier) in &self.witnesses {
            match note.verify(verifier) {
                Ok(()) => {
                    valid.insert(witness.as_str());
                }
                Err(e) => tracing::debug!(%witness, error = %e, "witness did not cosign"),
            }
        }

        if self.group_satisfied(name, &valid) {
            Ok(())
        } else {
            Err(Error::WitnessPolicyUnsatisfied(format!(
                "cosignature quorum {:?} not reached",
                name
            )))
        }
    }

    fn group_satisfied(&self, name: &str, valid: &HashSet<&str>) -> bool {
        if self.witnesses.contains_key(name) {
            return valid.contains(name);
        }

        match self.groups.get(name) {
            Some(group) => {
                let count = group
                    .members
                    .iter()
                    .filter(|m| self.group_satisfied(m, valid))
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
