// models/src/medical/mod.rs
pub mod features;
pub mod flags;
pub mod triage;
pub mod vitals;

pub use features::FeatureRecord;
pub use flags::CriticalFlags;
pub use triage::{Decision, DecisionReason, QueueAction, QueueCategory, TriageLabel, UpdateCounts, UpdateOutcome};
pub use vitals::{NormalizedVitals, Vital};
