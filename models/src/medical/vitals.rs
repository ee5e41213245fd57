// models/src/medical/vitals.rs
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// The seven vital-sign fields the decision engine understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Vital {
    BloodPressureSystolic,
    BloodPressureDiastolic,
    PulseRate,
    RespiratoryRate,
    Temperature,
    O2Saturation,
    Avpu,
}

impl Vital {
    pub const ALL: [Vital; 7] = [
        Vital::BloodPressureSystolic,
        Vital::BloodPressureDiastolic,
        Vital::PulseRate,
        Vital::RespiratoryRate,
        Vital::Temperature,
        Vital::O2Saturation,
        Vital::Avpu,
    ];

    /// Canonical field name, as it appears in documents and feature columns.
    pub fn name(self) -> &'static str {
        match self {
            Vital::BloodPressureSystolic => "BloodPressureSystolic",
            Vital::BloodPressureDiastolic => "BloodPressureDiastolic",
            Vital::PulseRate => "PulseRate",
            Vital::RespiratoryRate => "RespiratoryRate",
            Vital::Temperature => "Temperature",
            Vital::O2Saturation => "O2Saturation",
            Vital::Avpu => "AVPU",
        }
    }

    /// Legacy spellings found in historical documents.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Vital::BloodPressureSystolic => &["BlooddpressurSystol"],
            Vital::BloodPressureDiastolic => &["BlooddpressurDiastol"],
            _ => &[],
        }
    }

    /// Name of the 0/1 missingness indicator column for this vital.
    pub fn missing_column(self) -> String {
        format!("{}_missing", self.name())
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Vital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every vital present, missing encoded explicitly as `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedVitals {
    values: [Option<f64>; 7],
}

impl NormalizedVitals {
    pub fn all_missing() -> Self {
        Self::default()
    }

    pub fn get(&self, vital: Vital) -> Option<f64> {
        self.values[vital.index()]
    }

    /// Stores a value; NaN is stored as missing.
    pub fn set(&mut self, vital: Vital, value: Option<f64>) {
        self.values[vital.index()] = value.filter(|v| !v.is_nan());
    }

    pub fn with(mut self, vital: Vital, value: f64) -> Self {
        self.set(vital, Some(value));
        self
    }

    pub fn is_missing(&self, vital: Vital) -> bool {
        self.get(vital).is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Vital, Option<f64>)> + '_ {
        Vital::ALL.iter().map(move |v| (*v, self.get(*v)))
    }
}

impl Serialize for NormalizedVitals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Vital::ALL.len()))?;
        for (vital, value) in self.iter() {
            map.serialize_entry(vital.name(), &value)?;
        }
        map.end()
    }
}
