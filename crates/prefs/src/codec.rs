use crate::Result;
use std::collections::BTreeSet;

/// Separator used by releases that stored the blacklist as a joined string
pub const LEGACY_DELIMITER: char = ';';

/// Encode identifiers for storage in a string preference.
///
/// An empty set encodes to the empty string so a cleared blacklist reads the
/// same as one that was never written.
pub fn encode_ids(ids: &BTreeSet<String>) -> Result<String> {
    if ids.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(ids)?)
}

/// Decode a stored blacklist value.
///
/// Accepts the JSON array format and the legacy `;`-joined format. Empty
/// segments never become identifiers.
pub fn decode_ids(value: &str) -> BTreeSet<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return BTreeSet::new();
    }

    if trimmed.starts_with('[') {
        return match serde_json::from_str::<Vec<String>>(trimmed) {
            Ok(ids) => ids.into_iter().filter(|id| !id.is_empty()).collect(),
            Err(err) => {
                log::warn!("Ignoring malformed blacklist preference: {err}");
                BTreeSet::new()
            }
        };
    }

    value
        .split(LEGACY_DELIMITER)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn empty_value_is_empty_set() {
        assert!(decode_ids("").is_empty());
        assert!(decode_ids("   ").is_empty());
        assert!(decode_ids(";;").is_empty());
        assert_eq!(encode_ids(&BTreeSet::new()).unwrap(), "");
    }

    #[test]
    fn legacy_values_are_split() {
        assert_eq!(decode_ids("a;b;;c"), set(&["a", "b", "c"]));
    }

    #[test]
    fn delimiter_inside_ids_survives() {
        let ids = set(&["left;right", "100% PLA", "[bracketed]"]);
        let encoded = encode_ids(&ids).unwrap();
        assert_eq!(decode_ids(&encoded), ids);
    }

    #[test]
    fn malformed_json_blacklists_nothing() {
        assert!(decode_ids("[\"unterminated").is_empty());
        assert!(decode_ids("[1, 2]").is_empty());
    }
}
