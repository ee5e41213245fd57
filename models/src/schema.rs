// models/src/schema.rs
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::{TriageError, TriageResult, ValidationError};
use crate::medical::features::{categorical_columns, numeric_columns, passthrough_columns};
use crate::properties::FeatureValue;

pub const CURRENT_POLICY_VERSION: u32 = 1;
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Defaults applied to absent fields. Persisted with the artifact so that an
/// old artifact keeps the conventions it was trained with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefaultPolicy {
    pub policy_version: u32,
    pub categorical_fill: String,
    /// Value inserted for an absent numeric column; `None` keeps the missing marker.
    #[serde(default)]
    pub numeric_fill: Option<f64>,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self {
            policy_version: CURRENT_POLICY_VERSION,
            categorical_fill: UNKNOWN_CATEGORY.to_string(),
            numeric_fill: None,
        }
    }
}

impl DefaultPolicy {
    pub fn numeric_default(&self) -> FeatureValue {
        FeatureValue::from_option(self.numeric_fill)
    }

    pub fn categorical_default(&self) -> FeatureValue {
        FeatureValue::Text(self.categorical_fill.clone())
    }
}

/// The ordered set of columns a classifier was trained on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    /// Columns consumed as-is (missingness indicators, critical flags).
    pub passthrough: Vec<String>,
    pub defaults: DefaultPolicy,
}

impl FeatureSchema {
    /// The schema matching the columns produced by the feature builder.
    pub fn canonical(defaults: DefaultPolicy) -> Self {
        Self {
            numeric: numeric_columns(),
            categorical: categorical_columns(),
            passthrough: passthrough_columns(),
            defaults,
        }
    }

    /// All declared columns, numeric first, then categorical, then passthrough.
    pub fn all_columns(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .chain(self.passthrough.iter())
            .map(String::as_str)
    }

    /// Rejects schemas that cannot describe a trained classifier.
    pub fn validate(&self) -> TriageResult<()> {
        if self.numeric.is_empty() && self.categorical.is_empty() {
            return Err(TriageError::SchemaMismatch(
                "artifact declares no numeric or categorical features".to_string(),
            ));
        }
        if self.numeric.is_empty() {
            return Err(TriageError::SchemaMismatch("artifact declares an empty numeric feature list".to_string()));
        }
        if self.defaults.categorical_fill.is_empty() {
            return Err(TriageError::SchemaMismatch("categorical default must not be empty".to_string()));
        }
        if self.defaults.policy_version > CURRENT_POLICY_VERSION {
            return Err(TriageError::SchemaMismatch(format!(
                "default policy version {} is newer than supported version {}",
                self.defaults.policy_version, CURRENT_POLICY_VERSION
            )));
        }
        let mut seen = HashSet::new();
        for column in self.all_columns() {
            if column.is_empty() {
                return Err(TriageError::SchemaMismatch("empty feature name".to_string()));
            }
            if !seen.insert(column) {
                return Err(TriageError::SchemaMismatch(
                    ValidationError::DuplicateFeature(column.to_string()).to_string(),
                ));
            }
        }
        Ok(())
    }
}
