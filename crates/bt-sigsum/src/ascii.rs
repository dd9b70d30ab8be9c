//! Helpers for Sigsum's line-oriented ASCII format
//!
//! Documents are sequences of `key=value` lines; multi-field values separate
//! their fields with single spaces, and blank lines delimit sections.

use bt_transparency::{Error, Result};

/// Split a document into its blank-line separated sections
pub(crate) fn sections(text: &str) -> Vec<Vec<&str>> {
    let mut sections = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !current.is_empty() {
                sections.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        sections.push(current);
    }

    sections
}

/// Extract the value of a `key=value` line, checking the key
pub(crate) fn value<'a>(line: &'a str, key: &str) -> Result<&'a str> {
    match line.split_once('=') {
        Some((k, v)) if k == key => Ok(v),
        Some((k, _)) => Err(Error::Parse(format!(
            "expected {:?} line, found {:?}",
            key, k
        ))),
        None => Err(Error::Parse(format!("malformed line: {:?}", line))),
    }
}

/// Decode a fixed-size hex field
pub(crate) fn hex_array<const N: usize>(field: &str) -> Result<[u8; N]> {
    let bytes =
        hex::decode(field).map_err(|e| Error::Parse(format!("invalid hex value: {}", e)))?;

    bytes
        .try_into()
        .map_err(|_| Error::Parse(format!("invalid value length, expected {} bytes", N)))
}

/// Parse a decimal integer field
pub(crate) fn integer(field: &str) -> Result<u64> {
    field
        .parse::<u64>()
        .map_err(|_| Error::Parse(format!("invalid integer: {:?}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections() {
        let doc = "a=1\nb=2\n\nc=3\n\n\nd=4\n";
        let s = sections(doc);

        assert_eq!(s.len(), 3);
        assert_eq!(s[0], vec!["a=1", "b=2"]);
        assert_eq!(s[1], vec!["c=3"]);
        assert_eq!(s[2], vec!["d=4"]);
    }

    #[test]
    fn test_value() {
        assert_eq!(value("size=8584", "size").unwrap(), "8584");
        assert!(value("size=8584", "root_hash").is_err());
        assert!(value("no separator", "size").is_err());
    }

    #[test]
    fn test_hex_array() {
        let h: [u8; 4] = hex_array("deadbeef").unwrap();
        assert_eq!(h, [0xde, 0xad, 0xbe, 0xef]);

        assert!(hex_array::<4>("deadbe").is_err());
        assert!(hex_array::<4>("zzzzzzzz").is_err());
    }
}
