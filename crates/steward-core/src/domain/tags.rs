//! Tag model: actual tag sets, desired tag values and the diff between them.
//!
//! The provider always stores tag values as strings. Callers may describe the
//! desired state with numbers or booleans, so values are coerced to their
//! string form only when they are compared against (or written to) the
//! provider.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar tag value as supplied by a caller.
///
/// Deserializes from any JSON scalar: `"prod"`, `80`, `1.5`, `true`.
/// Numbers keep their source digits, so large integers are not rounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl TagValue {
    /// String form used for every comparison with provider values.
    ///
    /// Booleans render capitalized: `True` / `False`.
    pub fn coerce(&self) -> String {
        match self {
            TagValue::String(s) => s.clone(),
            TagValue::Number(n) => n.to_string(),
            TagValue::Bool(true) => "True".to_string(),
            TagValue::Bool(false) => "False".to_string(),
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.coerce())
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::String(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::String(value)
    }
}

impl From<i32> for TagValue {
    fn from(value: i32) -> Self {
        TagValue::Number(value.into())
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Number(value.into())
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

/// The tags actually carried by a resource (key -> string value).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

/// Repeated keys collapse to the last value seen.
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The tags a caller wants present on (or absent from) a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesiredTags(BTreeMap<String, TagValue>);

impl DesiredTags {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `true` when `key` is desired with exactly `actual` (after coercion).
    fn matches(&self, key: &str, actual: &str) -> bool {
        self.0.get(key).is_some_and(|v| v.coerce() == actual)
    }
}

/// Minimal set of tag mutations for one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDiff {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_add: Vec<(String, String)>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_remove: Vec<String>,
}

impl TagDiff {
    /// Tags that are missing from `actual` or carry a different value.
    pub fn for_present(actual: &TagSet, desired: &DesiredTags) -> Self {
        let to_add = desired
            .iter()
            .map(|(key, value)| (key, value.coerce()))
            .filter(|(key, value)| actual.get(key) != Some(value.as_str()))
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        Self {
            to_add,
            to_remove: Vec::new(),
        }
    }

    /// Tags present in `actual` whose key *and* value match a desired entry.
    pub fn for_absent(actual: &TagSet, desired: &DesiredTags) -> Self {
        let to_remove = actual
            .iter()
            .filter(|(key, value)| desired.matches(key, value))
            .map(|(key, _)| key.to_string())
            .collect();
        Self {
            to_add: Vec::new(),
            to_remove,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// The tag set that results from applying this diff to `actual`.
    ///
    /// Used for dry runs; `actual` itself is left untouched.
    pub fn apply_to(&self, actual: &TagSet) -> TagSet {
        let mut next = actual.clone();
        for key in &self.to_remove {
            next.remove(key);
        }
        for (key, value) in &self.to_add {
            next.insert(key.clone(), value.clone());
        }
        next
    }
}
