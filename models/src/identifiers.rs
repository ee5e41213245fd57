// models/src/identifiers.rs

use core::ops::Deref;
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ValidationError, ValidationResult};

/// An externally supplied record identifier, e.g. the appointment a decision
/// should be written back to. Identifiers are between 1 and 255 bytes long.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new identifier.
    ///
    /// # Errors
    /// Returns a `ValidationError` if the `value` is not between 1 and 255
    /// bytes in length (inclusive) or contains control characters.
    pub fn new(value: String) -> ValidationResult<Self> {
        if value.is_empty() || value.len() > u8::MAX as usize {
            return Err(ValidationError::InvalidIdentifierLength);
        }
        if value.chars().any(char::is_control) {
            return Err(ValidationError::InvalidIdentifier(value));
        }
        Ok(Self(value))
    }

    /// Reads an identifier out of a raw document value. Accepts plain strings,
    /// integers and the boxed `{"$oid": "..."}` form.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::new(s.trim().to_string()).ok(),
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::new(n.to_string()).ok(),
            Value::Object(map) => map.get("$oid").and_then(Self::from_value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for RecordId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for RecordId {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RecordId {
    type Error = ValidationError;

    fn try_from(value: String) -> ValidationResult<Self> {
        Self::new(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}
