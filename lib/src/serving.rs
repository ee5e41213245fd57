// lib/src/serving.rs
//
// The serving context is built once at startup and shared read-only. A failed
// artifact load leaves it in the unavailable state; it never aborts the
// process.

use std::path::Path;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{TriageError, TriageResult};

use crate::classifier::{ClassifierAdapter, ModelArtifact};
use crate::combiner::DecisionThresholds;

#[derive(Debug)]
pub enum ModelState {
    Ready {
        adapter: ClassifierAdapter,
        artifact_id: Uuid,
        trained_at: DateTime<Utc>,
    },
    Unavailable {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub model_loaded: bool,
    pub model_error: Option<String>,
    pub artifact_id: Option<Uuid>,
    pub trained_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct ServingContext {
    state: ModelState,
    thresholds: DecisionThresholds,
}

impl ServingContext {
    /// Loads the artifact at `path`. Any failure is recorded, not returned.
    pub fn load(path: impl AsRef<Path>, thresholds: DecisionThresholds) -> Self {
        let path = path.as_ref();
        match ModelArtifact::load(path) {
            Ok(artifact) => {
                info!("Model artifact loaded from {}", path.display());
                Self::from_artifact(artifact, thresholds)
            }
            Err(e) => {
                warn!("Model not loaded from {}: {}", path.display(), e);
                Self::unavailable(e.to_string(), thresholds)
            }
        }
    }

    pub fn from_artifact(artifact: ModelArtifact, thresholds: DecisionThresholds) -> Self {
        let artifact_id = artifact.artifact_id;
        let trained_at = artifact.trained_at;
        let state = match artifact.into_adapter() {
            Ok(adapter) => ModelState::Ready { adapter, artifact_id, trained_at },
            Err(e) => {
                warn!("Artifact {} rejected: {}", artifact_id, e);
                ModelState::Unavailable { reason: e.to_string() }
            }
        };
        Self { state, thresholds }
    }

    /// Wraps an adapter built elsewhere, e.g. around a custom classifier.
    pub fn from_adapter(
        adapter: ClassifierAdapter,
        artifact_id: Uuid,
        trained_at: DateTime<Utc>,
        thresholds: DecisionThresholds,
    ) -> Self {
        Self { state: ModelState::Ready { adapter, artifact_id, trained_at }, thresholds }
    }

    pub fn unavailable(reason: impl Into<String>, thresholds: DecisionThresholds) -> Self {
        Self { state: ModelState::Unavailable { reason: reason.into() }, thresholds }
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn thresholds(&self) -> &DecisionThresholds {
        &self.thresholds
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ModelState::Ready { .. })
    }

    /// The loaded adapter, or `ModelUnavailable` with the load failure.
    pub fn adapter(&self) -> TriageResult<&ClassifierAdapter> {
        match &self.state {
            ModelState::Ready { adapter, .. } => Ok(adapter),
            ModelState::Unavailable { reason } => Err(TriageError::ModelUnavailable(reason.clone())),
        }
    }

    pub fn health(&self) -> HealthReport {
        match &self.state {
            ModelState::Ready { artifact_id, trained_at, .. } => HealthReport {
                status: "ok".into(),
                model_loaded: true,
                model_error: None,
                artifact_id: Some(*artifact_id),
                trained_at: Some(*trained_at),
            },
            ModelState::Unavailable { reason } => HealthReport {
                status: "ok".into(),
                model_loaded: false,
                model_error: Some(reason.clone()),
                artifact_id: None,
                trained_at: None,
            },
        }
    }
}
