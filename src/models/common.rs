//! Shared row shapes for simple child collections

use super::validate::{self, Validate, MAX_FIELD_LENGTH};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A key mapped to a string value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMap {
    pub key: String,
    pub value: String,
}

impl StringMap {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

impl Validate for StringMap {
    fn validate(&self) -> Result<()> {
        validate::required("key", &self.key)?;
        validate::max_length("key", &self.key, MAX_FIELD_LENGTH)?;
        validate::max_length("value", &self.value, MAX_FIELD_LENGTH)
    }
}

/// A single string entry in a list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringList {
    pub value: String,
}

impl StringList {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

impl Validate for StringList {
    fn validate(&self) -> Result<()> {
        validate::required("value", &self.value)?;
        validate::max_length("value", &self.value, MAX_FIELD_LENGTH)
    }
}

/// Collect entries into a mapping, `None` when there are none.
///
/// Later entries win over earlier ones with the same key.
pub fn to_mapping<'a, I>(entries: I) -> Option<BTreeMap<String, String>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mapping: BTreeMap<String, String> = entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if mapping.is_empty() {
        None
    } else {
        Some(mapping)
    }
}

/// Collect string-map rows into a mapping
pub fn string_mapping(entries: &[StringMap]) -> Option<BTreeMap<String, String>> {
    to_mapping(entries.iter().map(|e| (e.key.as_str(), e.value.as_str())))
}

/// Set the value for a key, replacing any existing row with that key
pub fn upsert(entries: &mut Vec<StringMap>, key: &str, value: &str) {
    match entries.iter_mut().find(|e| e.key == key) {
        Some(entry) => entry.value = value.to_string(),
        None => entries.push(StringMap::new(key, value)),
    }
}

/// Drop every row with the given key, returning whether any were removed
pub fn remove_key(entries: &mut Vec<StringMap>, key: &str) -> bool {
    let before = entries.len();
    entries.retain(|e| e.key != key);
    entries.len() != before
}
