// lib/src/storage_engine/inmemory_storage.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use models::{QueueCategory, RawRecord, RecordId, TriageResult, UpdateCounts};

use super::storage_engine::{apply_queue_change, QueueStore, RecordSource};

/// Process-local document store, used by `predict` runs without a database
/// and by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    documents: Arc<RwLock<HashMap<RecordId, RawRecord>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, id: RecordId, document: RawRecord) {
        self.documents.write().await.insert(id, document);
    }

    pub async fn get(&self, id: &RecordId) -> Option<RawRecord> {
        self.documents.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl QueueStore for InMemoryStorage {
    async fn promote(
        &self,
        appointment_id: &RecordId,
        category: QueueCategory,
        at: DateTime<Utc>,
    ) -> TriageResult<UpdateCounts> {
        let mut documents = self.documents.write().await;
        Ok(match documents.get_mut(appointment_id) {
            Some(doc) => UpdateCounts { matched: 1, modified: apply_queue_change(doc, category, at) as u64 },
            None => UpdateCounts::default(),
        })
    }

    fn get_type(&self) -> &'static str {
        "InMemory"
    }
}

#[async_trait]
impl RecordSource for InMemoryStorage {
    async fn fetch_all(&self, limit: Option<usize>) -> TriageResult<Vec<RawRecord>> {
        let documents = self.documents.read().await;
        let mut ids: Vec<&RecordId> = documents.keys().collect();
        ids.sort();
        Ok(ids
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .filter_map(|id| documents.get(id).cloned())
            .collect())
    }

    fn describe(&self) -> String {
        "in-memory document store".to_string()
    }
}
