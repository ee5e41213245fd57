// models/src/properties.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single model-input column value.
///
/// `Missing` is the explicit missing marker for numeric columns; it serializes
/// as JSON `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FeatureValue {
    pub fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(v) if !v.is_nan() => FeatureValue::Number(v),
            _ => FeatureValue::Missing,
        }
    }

    pub fn from_flag(value: bool) -> Self {
        FeatureValue::Number(if value { 1.0 } else { 0.0 })
    }

    /// Numeric view of the value. Text and missing values yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FeatureValue::Missing)
    }
}

impl From<String> for FeatureValue { fn from(s: String) -> Self { FeatureValue::Text(s) } }
impl From<&str> for FeatureValue { fn from(s: &str) -> Self { FeatureValue::Text(s.to_string()) } }
impl From<f64> for FeatureValue { fn from(f: f64) -> Self { FeatureValue::from_option(Some(f)) } }
impl From<Option<f64>> for FeatureValue { fn from(f: Option<f64>) -> Self { FeatureValue::from_option(f) } }
impl From<bool> for FeatureValue { fn from(b: bool) -> Self { FeatureValue::from_flag(b) } }

/// A named set of model-input columns. Column order is the lexicographic
/// order of the names; models address columns by name, never by position.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRow(BTreeMap<String, FeatureValue>);

impl FeatureRow {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Inserts only when the column is absent. Returns true if it inserted.
    pub fn insert_if_absent(&mut self, name: &str, value: FeatureValue) -> bool {
        if self.0.contains_key(name) {
            return false;
        }
        self.0.insert(name.to_string(), value);
        true
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, FeatureValue)> for FeatureRow {
    fn from_iter<I: IntoIterator<Item = (String, FeatureValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
