// lib/src/storage_engine/json_source.rs
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{info, warn};
use serde_json::Value;

use models::{RawRecord, TriageError, TriageResult};

use super::storage_engine::RecordSource;

/// Raw documents from a file holding either one JSON array or one JSON
/// document per line.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parses a JSON array or JSON-lines text into documents. Entries that are
/// not objects are skipped.
pub fn parse_documents(text: &str) -> TriageResult<Vec<RawRecord>> {
    let values: Vec<Value> = if text.trim_start().starts_with('[') {
        serde_json::from_str(text)?
    } else {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| {
                    TriageError::DeserializationError(format!("line {}: {}", n + 1, e))
                })
            })
            .collect::<TriageResult<_>>()?
    };
    Ok(values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match value {
            Value::Object(map) => Some(map),
            other => {
                warn!("Skipping entry {}: expected a JSON object, found {}", i, other);
                None
            }
        })
        .collect())
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn fetch_all(&self, limit: Option<usize>) -> TriageResult<Vec<RawRecord>> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let mut records = parse_documents(&text)?;
        if let Some(max) = limit {
            records.truncate(max);
        }
        info!("Read {} documents from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn should_parse_arrays_and_json_lines() {
        let array = parse_documents(r#"[{"a": 1}, 5, {"b": 2}]"#).unwrap();
        assert_eq!(array.len(), 2);
        let lines = parse_documents("{\"a\": 1}\n\n{\"b\": 2}\n").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["b"], 2);
    }

    #[test]
    fn should_point_at_the_bad_line() {
        let err = parse_documents("{\"a\": 1}\n{oops\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn should_read_a_file_with_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("patients.jsonl");
        std::fs::write(&path, "{\"id\": 1}\n{\"id\": 2}\n{\"id\": 3}\n").unwrap();
        let source = JsonFileSource::new(&path);
        assert_eq!(source.fetch_all(None).await.unwrap().len(), 3);
        assert_eq!(source.fetch_all(Some(2)).await.unwrap().len(), 2);
        assert!(JsonFileSource::new(dir.path().join("none.json")).fetch_all(None).await.is_err());
    }
}
