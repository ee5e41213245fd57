// server/src/cli/handlers.rs

// Implementations behind each CLI subcommand.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use uuid::Uuid;

use lib::storage_engine::{parse_documents, put_document};
use lib::{
    open_sled_db, train_from_source, JsonFileSource, QueueStore, RecordSource, ServingContext, SledQueueStore,
    SledRecordSource, TrainingReport, TriageConfig, TriageService,
};
use models::RecordId;
use rest_api::{start_server, RestApiConfig};

use super::commands::TreeKind;

/// Trains from `input` or, with `from_store`, from the configured patients
/// tree and writes the artifact to `output` (or `model.path`).
pub async fn handle_train(
    config: &TriageConfig,
    input: Option<PathBuf>,
    from_store: bool,
    limit: Option<usize>,
    output: Option<PathBuf>,
) -> Result<TrainingReport> {
    let source: Box<dyn RecordSource> = match (input, from_store) {
        (Some(path), false) => Box::new(JsonFileSource::new(path)),
        (None, true) => {
            let db = open_sled_db(&config.storage.data_directory)?;
            Box::new(SledRecordSource::open(&db, &config.storage.patients_tree)?)
        }
        (Some(_), true) => bail!("--input and --from-store are mutually exclusive"),
        (None, false) => bail!("no training source: pass --input FILE or --from-store"),
    };

    let (artifact, report) = train_from_source(source.as_ref(), limit, &config.training).await?;
    let output = output.unwrap_or_else(|| config.model.path.clone());
    artifact
        .save(&output)
        .with_context(|| format!("Failed to write model artifact to {:?}", output))?;

    info!(
        "Trained artifact {} on {} rows ({} dropped without grade), saved to {:?}",
        report.artifact_id, report.train_rows, report.dropped_unlabeled, output
    );
    Ok(report)
}

/// Opens the appointments tree for write-back. A store that cannot be opened
/// only disables updates.
fn open_queue_store(config: &TriageConfig) -> Option<Arc<dyn QueueStore>> {
    let opened = open_sled_db(&config.storage.data_directory)
        .and_then(|db| SledQueueStore::open(&db, &config.storage.appointments_tree));
    match opened {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!("Queue write-back disabled: {}", e);
            None
        }
    }
}

fn build_service(config: &TriageConfig, store: Option<Arc<dyn QueueStore>>) -> TriageService {
    let context = ServingContext::load(&config.model.path, config.thresholds);
    if !context.is_ready() {
        warn!("Starting without a model; predictions will be refused until one is trained");
    }
    TriageService::new(Arc::new(context), store, config.storage.update_timeout())
}

/// Runs the REST API until Ctrl-C.
pub async fn handle_serve(config: &TriageConfig, port: Option<u16>) -> Result<()> {
    let rest_config = RestApiConfig::from_triage_config(config)?.with_port(port);
    if rest_config.policy.is_open() {
        warn!("No API key configured; the predict endpoint is open to any caller");
    }
    let service = Arc::new(build_service(config, open_queue_store(config)));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down REST API");
        }
        let _ = shutdown_tx.send(());
    });

    start_server(rest_config, service, shutdown_rx).await
}

/// Scores the records in `input` and returns the decisions as JSON.
pub async fn handle_predict(config: &TriageConfig, input: &Path, apply_update: bool) -> Result<Value> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {:?}", input))?;
    let records = parse_documents(&text)?;
    let store = if apply_update { open_queue_store(config) } else { None };
    let service = build_service(config, store);
    let decisions = service.predict(records, apply_update).await?;
    Ok(json!({ "results": decisions }))
}

/// Fetches `/api/v1/health` from a running server.
pub async fn handle_status(config: &TriageConfig, port: Option<u16>) -> Result<Value> {
    let port = port.unwrap_or(config.server.port);
    let client = Client::builder().timeout(Duration::from_secs(2)).build()?;
    let url = format!("http://127.0.0.1:{}/api/v1/health", port);
    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(resp.json::<Value>().await?),
        Ok(resp) => Err(anyhow!("REST API health check failed with status: {}", resp.status())),
        Err(e) => Err(anyhow!("Failed to connect to REST API on port {}: {}", port, e)),
    }
}

/// Copies the documents in `input` into the chosen tree. Returns how many
/// were written.
pub async fn handle_import(config: &TriageConfig, input: &Path, tree: TreeKind, id_field: &str) -> Result<usize> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {:?}", input))?;
    let documents = parse_documents(&text)?;

    let tree_name = match tree {
        TreeKind::Patients => &config.storage.patients_tree,
        TreeKind::Appointments => &config.storage.appointments_tree,
    };
    let db = open_sled_db(&config.storage.data_directory)?;
    let target = db.open_tree(tree_name)?;

    for document in &documents {
        let id = match document.get(id_field).and_then(RecordId::from_value) {
            Some(id) => id,
            None => RecordId::new(Uuid::new_v4().to_string())?,
        };
        put_document(&target, &id, document)?;
    }
    target.flush_async().await?;
    info!("Imported {} documents into tree '{}'", documents.len(), tree_name);
    Ok(documents.len())
}

pub fn handle_hash_key(key: &str) -> Result<String> {
    security::hash_api_key(key).map_err(|e| anyhow!("Failed to hash API key: {}", e))
}
