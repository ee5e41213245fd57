// models/src/lib.rs
//! Shared data model for the triage decision engine: raw-record values,
//! normalized vitals, feature records, safety flags, decisions and the
//! persisted feature schema.

pub mod errors;
pub mod identifiers;
pub mod medical;
pub mod properties;
pub mod schema;

pub use errors::{TriageError, TriageResult, ValidationError};
pub use identifiers::RecordId;
pub use medical::{
    CriticalFlags, Decision, DecisionReason, FeatureRecord, NormalizedVitals, QueueAction, QueueCategory,
    TriageLabel, UpdateCounts, UpdateOutcome, Vital,
};
pub use properties::{FeatureRow, FeatureValue};
pub use schema::{DefaultPolicy, FeatureSchema};

/// A raw patient document: an open mapping from field name to any JSON value.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;
