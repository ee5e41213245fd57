// lib/src/storage_engine/sled_storage.rs
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde_json::Value;
use sled::{Db, Tree};

use models::{QueueCategory, RawRecord, RecordId, TriageError, TriageResult, UpdateCounts};

use super::storage_engine::{apply_queue_change, QueueStore, RecordSource};

pub fn open_sled_db(path: &Path) -> TriageResult<Db> {
    info!("Opening Sled database at {:?}", path);
    sled::Config::new().path(path).open().map_err(|e| {
        error!("Failed to open Sled database at {:?}: {}", path, e);
        TriageError::StorageError(format!(
            "Failed to open Sled database at {:?}: {}. Ensure the directory is accessible.",
            path, e
        ))
    })
}

fn decode_document(key: &[u8], bytes: &[u8]) -> TriageResult<RawRecord> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(map) => Ok(map),
        other => Err(TriageError::InvalidData(format!(
            "document {} is not a JSON object but {}",
            String::from_utf8_lossy(key),
            other
        ))),
    }
}

/// Writes a JSON document under `id`, replacing any previous value.
pub fn put_document(tree: &Tree, id: &RecordId, document: &RawRecord) -> TriageResult<()> {
    tree.insert(id.as_bytes(), serde_json::to_vec(document)?)?;
    Ok(())
}

pub fn get_document(tree: &Tree, id: &RecordId) -> TriageResult<Option<RawRecord>> {
    tree.get(id.as_bytes())?
        .map(|bytes| decode_document(id.as_bytes(), &bytes))
        .transpose()
}

/// Appointment documents in a sled tree, keyed by appointment id.
#[derive(Debug, Clone)]
pub struct SledQueueStore {
    tree: Tree,
}

impl SledQueueStore {
    pub fn open(db: &Db, tree_name: &str) -> TriageResult<Self> {
        Ok(Self { tree: db.open_tree(tree_name)? })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }
}

#[async_trait]
impl QueueStore for SledQueueStore {
    async fn promote(
        &self,
        appointment_id: &RecordId,
        category: QueueCategory,
        at: DateTime<Utc>,
    ) -> TriageResult<UpdateCounts> {
        let key = appointment_id.as_bytes();
        loop {
            let Some(current) = self.tree.get(key)? else {
                debug!("Appointment {} not found, nothing to update", appointment_id);
                return Ok(UpdateCounts::default());
            };
            let mut document = decode_document(key, &current)?;
            if !apply_queue_change(&mut document, category, at) {
                return Ok(UpdateCounts { matched: 1, modified: 0 });
            }
            let updated = serde_json::to_vec(&document)?;
            match self.tree.compare_and_swap(key, Some(&current), Some(updated))? {
                Ok(()) => {
                    self.tree.flush_async().await?;
                    debug!("Appointment {} moved to queue {}", appointment_id, category.as_str());
                    return Ok(UpdateCounts { matched: 1, modified: 1 });
                }
                Err(_) => {
                    debug!("Concurrent write on appointment {}, retrying", appointment_id);
                }
            }
        }
    }

    fn get_type(&self) -> &'static str {
        "Sled"
    }
}

/// Patient documents in a sled tree, read in key order.
#[derive(Debug, Clone)]
pub struct SledRecordSource {
    tree: Tree,
    name: String,
}

impl SledRecordSource {
    pub fn open(db: &Db, tree_name: &str) -> TriageResult<Self> {
        Ok(Self { tree: db.open_tree(tree_name)?, name: tree_name.to_string() })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }
}

#[async_trait]
impl RecordSource for SledRecordSource {
    async fn fetch_all(&self, limit: Option<usize>) -> TriageResult<Vec<RawRecord>> {
        let mut records = Vec::new();
        for entry in self.tree.iter() {
            if limit.is_some_and(|max| records.len() >= max) {
                break;
            }
            let (key, bytes) = entry?;
            match decode_document(&key, &bytes) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable document in tree '{}': {}", self.name, e),
            }
        }
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("sled tree '{}'", self.name)
    }
}
