// lib/src/normalizer.rs
//
// Numeric coercion for document fields. Every call is total: anything that
// is not a number comes back as `None`, the missing marker.

use log::trace;
use serde_json::Value;

/// Keys of the boxed numeric wrappers, checked in this order.
pub const BOXED_NUMBER_KEYS: [&str; 3] = ["$numberDouble", "$numberInt", "$numberLong"];

/// Coerces a raw field value into a float, or `None` when it cannot be read
/// as a number. NaN is reported as missing; infinities are kept.
pub fn normalize_number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Object(map) => {
            let inner = BOXED_NUMBER_KEYS.iter().find_map(|key| map.get(*key))?;
            direct_number(inner)
        }
        other => direct_number(other),
    };
    parsed.filter(|v| !v.is_nan())
}

/// Same as [`normalize_number`], logging the field name when a present value
/// had to be dropped.
pub fn normalize_field(field: &str, value: Option<&Value>) -> Option<f64> {
    let normalized = normalize_number(value);
    if normalized.is_none() {
        if let Some(raw) = value.filter(|v| !v.is_null()) {
            trace!("Field '{}' is not numeric ({}), treating as missing", field, raw);
        }
    }
    normalized
}

fn direct_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}
