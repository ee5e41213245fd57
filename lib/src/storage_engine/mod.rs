// lib/src/storage_engine/mod.rs

pub mod inmemory_storage;
pub mod json_source;
pub mod sled_storage;
pub mod storage_engine;

pub use inmemory_storage::InMemoryStorage;
pub use json_source::{parse_documents, JsonFileSource};
pub use sled_storage::{get_document, open_sled_db, put_document, SledQueueStore, SledRecordSource};
pub use storage_engine::{QueueStore, RecordSource, QUEUE_FIELD, QUEUE_UPDATED_AT_FIELD};
