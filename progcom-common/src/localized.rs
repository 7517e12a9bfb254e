//! Language-tagged display strings
//!
//! The CfP service hands out names and labels as a mapping from language tag
//! to display string, with `en` present by convention. Equality is
//! structural.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A mapping from language tag (`en`, `de`, ...) to display string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedString(pub BTreeMap<String, String>);

impl LocalizedString {
    /// Create a string with only an `en` entry.
    pub fn english(text: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert("en".to_string(), text.into());
        LocalizedString(map)
    }

    /// Look up the string for a specific language tag.
    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    /// The `en` entry, falling back to the first entry in tag order.
    pub fn en(&self) -> Option<&str> {
        self.get("en")
            .or_else(|| self.0.values().next().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, lang: impl Into<String>, text: impl Into<String>) {
        self.0.insert(lang.into(), text.into());
    }
}

impl fmt::Display for LocalizedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.en().unwrap_or(""))
    }
}

impl From<&str> for LocalizedString {
    fn from(text: &str) -> Self {
        LocalizedString::english(text)
    }
}
