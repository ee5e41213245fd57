// models/src/medical/features.rs
use serde::Serialize;

use crate::medical::flags::CriticalFlags;
use crate::medical::vitals::{NormalizedVitals, Vital};
use crate::properties::{FeatureRow, FeatureValue};

pub const AGE: &str = "age";
pub const GENDER: &str = "gender";
pub const CHIEF_COMPLAINT: &str = "chiefComplaint";
/// Legacy spelling of `chiefComplaint` in historical documents.
pub const CHIEF_COMPLAINT_ALIAS: &str = "ChiefComplaint";

/// The canonical per-record feature set shared by training and inference.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub vitals: NormalizedVitals,
    pub age: Option<f64>,
    pub gender: String,
    #[serde(rename = "chiefComplaint")]
    pub chief_complaint: String,
    /// Computed once when the record is built and reused downstream.
    pub flags: CriticalFlags,
}

impl FeatureRecord {
    /// Flattens the record into named model-input columns: vitals, age,
    /// categorical fields, one missingness indicator per vital and the flags.
    pub fn to_row(&self) -> FeatureRow {
        let mut row = FeatureRow::new();
        for (vital, value) in self.vitals.iter() {
            row.insert(vital.name(), value);
            row.insert(vital.missing_column(), value.is_none());
        }
        row.insert(AGE, self.age);
        row.insert(GENDER, self.gender.as_str());
        row.insert(CHIEF_COMPLAINT, self.chief_complaint.as_str());
        for (name, raised) in self.flags.entries() {
            row.insert(name, FeatureValue::from_flag(raised));
        }
        row
    }
}

/// Names of the numeric columns the builder produces.
pub fn numeric_columns() -> Vec<String> {
    std::iter::once(AGE.to_string())
        .chain(Vital::ALL.iter().map(|v| v.name().to_string()))
        .collect()
}

pub fn categorical_columns() -> Vec<String> {
    vec![GENDER.to_string(), CHIEF_COMPLAINT.to_string()]
}

/// Missingness indicators followed by the critical flags.
pub fn passthrough_columns() -> Vec<String> {
    Vital::ALL
        .iter()
        .map(|v| v.missing_column())
        .chain(CriticalFlags::NAMES.iter().map(|n| n.to_string()))
        .collect()
}
