//! Color code table for tokens reported by the device

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable mapping from a short ASCII token (e.g. `"01"`) to a color name.
///
/// Serialized as a plain JSON object so a replacement table can be loaded
/// from a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorTable {
    entries: BTreeMap<String, String>,
}

impl ColorTable {
    /// Build a table from token/name pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Exact lookup of an already trimmed token
    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in token order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::from_pairs([
            ("01", "Blue"),
            ("11", "Green"),
            ("21", "Red"),
            ("31", "Yellow"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = ColorTable::default();
        assert_eq!(table.len(), 4);
        assert_eq!(table.lookup("01"), Some("Blue"));
        assert_eq!(table.lookup("11"), Some("Green"));
        assert_eq!(table.lookup("21"), Some("Red"));
        assert_eq!(table.lookup("31"), Some("Yellow"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let table = ColorTable::default();
        assert_eq!(table.lookup(" 01"), None);
        assert_eq!(table.lookup("0111"), None);
        assert_eq!(table.lookup("1"), None);
    }

    #[test]
    fn test_deserialize_from_object() {
        let table: ColorTable = serde_json::from_str(r#"{"A1": "Purple", "B2": "Orange"}"#).unwrap();
        assert_eq!(table.lookup("A1"), Some("Purple"));
        assert_eq!(table.lookup("01"), None);
        let tokens: Vec<&str> = table.iter().map(|(token, _)| token).collect();
        assert_eq!(tokens, vec!["A1", "B2"]);
    }
}
