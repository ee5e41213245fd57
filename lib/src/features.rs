// lib/src/features.rs
//
// Feature builder: raw documents in, canonical feature records out, index
// for index. The same code path serves training and inference.

use rayon::prelude::*;
use serde_json::Value;

use models::medical::features::{CHIEF_COMPLAINT, CHIEF_COMPLAINT_ALIAS, GENDER};
use models::medical::features::AGE;
use models::{DefaultPolicy, FeatureRecord, NormalizedVitals, RawRecord, Vital};

use crate::flags::evaluate_flags;
use crate::normalizer::{normalize_field, normalize_number};

/// First present, non-null value among the canonical name and its aliases.
fn lookup<'a>(record: &'a RawRecord, name: &str, aliases: &[&str]) -> Option<&'a Value> {
    std::iter::once(name)
        .chain(aliases.iter().copied())
        .filter_map(|key| record.get(key))
        .find(|v| !v.is_null())
}

pub fn normalize_vitals(record: &RawRecord) -> NormalizedVitals {
    let mut vitals = NormalizedVitals::all_missing();
    for vital in Vital::ALL {
        let raw = lookup(record, vital.name(), vital.aliases());
        vitals.set(vital, normalize_field(vital.name(), raw));
    }
    vitals
}

/// Reads a categorical field, falling back to the policy's fill value when
/// absent, null or blank. Non-string scalars are kept in their JSON text form.
fn categorical(record: &RawRecord, name: &str, aliases: &[&str], policy: &DefaultPolicy) -> String {
    let text = match lookup(record, name, aliases) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };
    if text.is_empty() {
        policy.categorical_fill.clone()
    } else {
        text
    }
}

pub fn build_feature_record(record: &RawRecord, policy: &DefaultPolicy) -> FeatureRecord {
    let vitals = normalize_vitals(record);
    let flags = evaluate_flags(&vitals);
    FeatureRecord {
        age: normalize_number(record.get(AGE)),
        gender: categorical(record, GENDER, &[], policy),
        chief_complaint: categorical(record, CHIEF_COMPLAINT, &[CHIEF_COMPLAINT_ALIAS], policy),
        vitals,
        flags,
    }
}

/// Builds one feature record per input record. Output index i corresponds to
/// input index i.
pub fn build_features(records: &[RawRecord], policy: &DefaultPolicy) -> Vec<FeatureRecord> {
    records
        .par_iter()
        .map(|record| build_feature_record(record, policy))
        .collect()
}
