// rest_api/src/lib.rs
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use anyhow::{Context, Error as AnyhowError};

use lib::classifier::ARTIFACT_FORMAT_VERSION;
use lib::{HealthReport, RawRecord, TriageService};
use models::TriageError;
use security::{require_api_key, ApiKeyPolicy};

mod config;
pub use crate::config::RestApiConfig;

// Define the REST API error enum
#[derive(Debug, Error)]
pub enum RestApiError {
    #[error(transparent)]
    Triage(#[from] TriageError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] AnyhowError),
}

impl RestApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            RestApiError::Triage(e) => match e {
                TriageError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                TriageError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                TriageError::InvalidData(_)
                | TriageError::MalformedField { .. }
                | TriageError::DeserializationError(_)
                | TriageError::Validation(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            RestApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RestApiError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Implement IntoResponse for RestApiError to convert it into an HTTP response
impl IntoResponse for RestApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

// Shared state for the Axum application
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TriageService>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PredictParams {
    #[serde(default)]
    pub apply_update: bool,
}

// Handler for the /api/v1/health endpoint
async fn health_check_handler(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.service.health())
}

// Handler for the /api/v1/version endpoint
async fn version_handler() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "artifact_format_version": ARTIFACT_FORMAT_VERSION,
            "api_level": 1,
        })),
    )
}

// Handler for the /api/v1/predict endpoint
async fn predict_handler(
    State(state): State<AppState>,
    params: Result<Query<PredictParams>, QueryRejection>,
    payload: Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<Json<Value>, RestApiError> {
    let Query(params) = params.map_err(|rejection| RestApiError::InvalidInput(rejection.body_text()))?;
    let Json(batch) = payload.map_err(|rejection| RestApiError::InvalidInput(rejection.body_text()))?;
    let records = batch
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            Value::Object(map) => Ok(map),
            _ => Err(RestApiError::InvalidInput(format!("record {} is not a JSON object", i))),
        })
        .collect::<Result<Vec<RawRecord>, _>>()?;
    info!("Predicting {} records (apply_update={})", records.len(), params.apply_update);
    let decisions = state.service.predict(records, params.apply_update).await?;
    Ok(Json(json!({ "results": decisions })))
}

/// Routes of the triage API. Only `/api/v1/predict` is guarded by the key
/// policy; health and version stay open.
pub fn build_router(service: Arc<TriageService>, policy: ApiKeyPolicy) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    let protected = Router::new()
        .route("/api/v1/predict", post(predict_handler))
        .route_layer(from_fn_with_state(Arc::new(policy), require_api_key));

    Router::new()
        .route("/api/v1/health", get(health_check_handler))
        .route("/api/v1/version", get(version_handler))
        .merge(protected)
        .with_state(AppState { service })
        .layer(cors)
}

// Main function to start the REST API server
pub async fn start_server(
    config: RestApiConfig,
    service: Arc<TriageService>,
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), AnyhowError> {
    let addr = config.address();
    let app = build_router(service, config.policy);

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;
    info!("REST API server listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
            info!("Received shutdown signal.");
        })
        .await
        .context("REST API server failed to start or run")?;

    info!("REST API server stopped.");
    Ok(())
}
