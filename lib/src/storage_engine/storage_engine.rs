// lib/src/storage_engine/storage_engine.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use models::{QueueCategory, RawRecord, RecordId, TriageResult, UpdateCounts};

/// Field receiving the queue category on an appointment document.
pub const QUEUE_FIELD: &str = "queue";
/// Field receiving the UTC time of the last queue change.
pub const QUEUE_UPDATED_AT_FIELD: &str = "queue_updated_at";

/// Write side of the decision flow: moves appointments between queues.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Sets the appointment's queue and update time. An unknown appointment
    /// is not an error; it reports zero matches.
    async fn promote(
        &self,
        appointment_id: &RecordId,
        category: QueueCategory,
        at: DateTime<Utc>,
    ) -> TriageResult<UpdateCounts>;

    fn get_type(&self) -> &'static str;
}

/// Read side of training: a bulk supply of raw patient documents.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_all(&self, limit: Option<usize>) -> TriageResult<Vec<RawRecord>>;

    fn describe(&self) -> String;
}

/// Applies a queue change to a document. Returns whether anything changed.
pub fn apply_queue_change(document: &mut RawRecord, category: QueueCategory, at: DateTime<Utc>) -> bool {
    let queue = serde_json::Value::from(category.as_str());
    let stamp = serde_json::Value::from(at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true));
    let mut changed = false;
    for (field, value) in [(QUEUE_FIELD, queue), (QUEUE_UPDATED_AT_FIELD, stamp)] {
        if document.get(field) != Some(&value) {
            document.insert(field.to_string(), value);
            changed = true;
        }
    }
    changed
}
