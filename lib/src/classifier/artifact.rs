// lib/src/classifier/artifact.rs
//
// The single persisted unit produced by training: classifier, label codec and
// feature schema travel together so that serving never pairs mismatched parts.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::medical::features::passthrough_columns;
use models::{FeatureSchema, TriageError, TriageResult};

use super::{Classifier, ClassifierAdapter, LabelCodec, TriagePipeline};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub artifact_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub classifier: TriagePipeline,
    pub codec: LabelCodec,
    pub schema: FeatureSchema,
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

impl ModelArtifact {
    pub fn new(classifier: TriagePipeline, codec: LabelCodec, schema: FeatureSchema) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            artifact_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            classifier,
            codec,
            schema,
        }
    }

    /// Checks that the parts of the artifact agree with each other.
    pub fn validate(&self) -> TriageResult<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(TriageError::SchemaMismatch(format!(
                "artifact format version {} is not supported (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        self.schema.validate()?;
        let produced = passthrough_columns();
        if let Some(name) = self.schema.passthrough.iter().find(|name| !produced.contains(*name)) {
            return Err(TriageError::SchemaMismatch(format!(
                "passthrough column '{}' is not produced by the feature builder",
                name
            )));
        }
        if !self.classifier.preprocessor.matches_schema(&self.schema) {
            return Err(TriageError::SchemaMismatch(
                "classifier was fitted on columns that differ from the declared schema".into(),
            ));
        }
        if self.codec.is_empty() {
            return Err(TriageError::SchemaMismatch("artifact carries an empty label codec".into()));
        }
        for id in self.classifier.classes() {
            self.codec.decode(*id)?;
        }
        Ok(())
    }

    /// Writes the artifact. A `.json` extension selects JSON, anything else bincode.
    pub fn save(&self, path: impl AsRef<Path>) -> TriageResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let bytes = if is_json(path) {
            serde_json::to_vec_pretty(self)?
        } else {
            bincode::serde::encode_to_vec(self, bincode::config::standard())?
        };
        fs::write(path, &bytes)?;
        info!("Saved model artifact {} to {} ({} bytes)", self.artifact_id, path.display(), bytes.len());
        Ok(())
    }

    /// Reads an artifact. Consistency is checked by [`ModelArtifact::into_adapter`].
    pub fn load(path: impl AsRef<Path>) -> TriageResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            TriageError::ModelUnavailable(format!("cannot read artifact {}: {}", path.display(), e))
        })?;
        let artifact: ModelArtifact = if is_json(path) {
            serde_json::from_slice(&bytes).map_err(|e| {
                TriageError::DeserializationError(format!("artifact {}: {}", path.display(), e))
            })?
        } else {
            let (artifact, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
            artifact
        };
        debug!("Loaded artifact {} trained at {}", artifact.artifact_id, artifact.trained_at);
        Ok(artifact)
    }

    /// Validates the artifact and wraps it for serving.
    pub fn into_adapter(self) -> TriageResult<ClassifierAdapter> {
        self.validate()?;
        ClassifierAdapter::new(Arc::new(self.classifier), self.codec, self.schema)
    }
}
