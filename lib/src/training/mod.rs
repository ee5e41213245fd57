// lib/src/training/mod.rs
//
// Offline path: raw documents -> features and labels -> fitted pipeline,
// evaluated on a stratified hold-out and packaged as one artifact.

pub mod metrics;
pub mod split;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{DefaultPolicy, FeatureRow, FeatureSchema, RawRecord, TriageError, TriageLabel, TriageResult};

use crate::classifier::{LabelCodec, ModelArtifact, TriagePipeline};
use crate::config::TrainingConfig;
use crate::features::build_feature_record;
use crate::labels::label_record;
use crate::schema::reconcile_row;
use crate::storage_engine::RecordSource;

pub use metrics::{ClassMetrics, EvaluationReport};
pub use split::{stratified_split, Split};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub artifact_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub fetched_rows: usize,
    pub labeled_rows: usize,
    pub dropped_unlabeled: usize,
    pub class_counts: BTreeMap<TriageLabel, usize>,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Absent when the hold-out set is empty.
    pub evaluation: Option<EvaluationReport>,
}

/// Trains an artifact from raw documents. Ungraded documents are dropped.
pub fn train(records: &[RawRecord], config: &TrainingConfig) -> TriageResult<(ModelArtifact, TrainingReport)> {
    let policy = DefaultPolicy::default();
    let schema = FeatureSchema::canonical(policy.clone());

    let labeled: Vec<(FeatureRow, TriageLabel)> = records
        .par_iter()
        .filter_map(|record| label_record(record).map(|label| (record, label)))
        .map(|(record, label)| {
            let row = reconcile_row(build_feature_record(record, &policy).to_row(), &schema)?;
            Ok((row, label))
        })
        .collect::<TriageResult<_>>()?;
    let dropped_unlabeled = records.len() - labeled.len();
    info!(
        "Fetched {} rows, {} labeled, {} dropped without a grade",
        records.len(),
        labeled.len(),
        dropped_unlabeled
    );
    if labeled.is_empty() {
        return Err(TriageError::TrainingError("no labeled rows to train on".into()));
    }

    let (rows, labels): (Vec<FeatureRow>, Vec<TriageLabel>) = labeled.into_iter().unzip();
    let mut class_counts = BTreeMap::new();
    for label in &labels {
        *class_counts.entry(*label).or_insert(0) += 1;
    }
    info!("Class counts: {:?}", class_counts);
    if class_counts.len() < 2 {
        return Err(TriageError::TrainingError(format!(
            "need at least two classes, found {:?}",
            class_counts.keys().collect::<Vec<_>>()
        )));
    }

    let codec = LabelCodec::fit(&labels)?;
    let targets = codec.encode_all(&labels)?;
    let split = stratified_split(&targets, config.test_fraction, config.random_state);
    info!("Training on {} rows, holding out {}", split.train.len(), split.test.len());

    let pick_rows = |idx: &[usize]| idx.iter().map(|i| rows[*i].clone()).collect::<Vec<_>>();
    let pick_targets = |idx: &[usize]| idx.iter().map(|i| targets[*i]).collect::<Vec<_>>();
    let train_rows = pick_rows(&split.train);
    let classifier = TriagePipeline::fit(&train_rows, &pick_targets(&split.train), &schema, config.fit_params())?;
    let artifact = ModelArtifact::new(classifier, codec, schema);
    let adapter = artifact.clone().into_adapter()?;

    let evaluation = if split.test.is_empty() {
        warn!("Hold-out set is empty, skipping evaluation");
        None
    } else {
        let (predicted, probabilities): (Vec<u32>, Vec<Vec<f64>>) =
            adapter.predict_encoded(&pick_rows(&split.test))?.into_iter().unzip();
        let report = metrics::evaluate(&artifact.codec, &pick_targets(&split.test), &predicted, &probabilities);
        info!("Hold-out accuracy {:.3}, macro AUC {:?}", report.accuracy, report.macro_auc);
        Some(report)
    };

    let report = TrainingReport {
        artifact_id: artifact.artifact_id,
        trained_at: artifact.trained_at,
        fetched_rows: records.len(),
        labeled_rows: rows.len(),
        dropped_unlabeled,
        class_counts,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        evaluation,
    };
    Ok((artifact, report))
}

/// Fetches from `source` and trains on a blocking worker.
pub async fn train_from_source(
    source: &dyn RecordSource,
    limit: Option<usize>,
    config: &TrainingConfig,
) -> TriageResult<(ModelArtifact, TrainingReport)> {
    info!("Fetching training documents from {}", source.describe());
    let records = source.fetch_all(limit).await?;
    let config = config.clone();
    tokio::task::spawn_blocking(move || train(&records, &config))
        .await
        .map_err(|e| TriageError::InternalError(format!("training task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_engine::InMemoryStorage;
    use serde_json::{json, Value};

    fn doc(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn synthetic_records(n: usize) -> Vec<RawRecord> {
        (0..n)
            .map(|i| match i % 3 {
                0 => doc(json!({
                    "O2Saturation": 84 + (i % 4), "PulseRate": 128, "RespiratoryRate": 30,
                    "gender": "M", "chiefComplaint": "dyspnea", "TriageGrade": 1
                })),
                1 => doc(json!({
                    "O2Saturation": 93, "PulseRate": 105 + (i % 5), "RespiratoryRate": 22,
                    "gender": "F", "chiefComplaint": "chest pain", "TriageGrade": 3
                })),
                _ => doc(json!({
                    "O2Saturation": 98, "PulseRate": 72 + (i % 6), "RespiratoryRate": 14,
                    "gender": "F", "chiefComplaint": "rash", "TriageGrade": 5
                })),
            })
            .collect()
    }

    fn quick() -> TrainingConfig {
        TrainingConfig { epochs: 200, ..TrainingConfig::default() }
    }

    #[test]
    fn should_train_and_report() {
        let mut records = synthetic_records(60);
        records.push(doc(json!({ "O2Saturation": 97 })));
        let (artifact, report) = train(&records, &quick()).unwrap();
        assert_eq!(report.fetched_rows, 61);
        assert_eq!(report.dropped_unlabeled, 1);
        assert_eq!(report.labeled_rows, 60);
        assert_eq!(report.class_counts[&TriageLabel::HighRisk], 20);
        assert_eq!(report.train_rows + report.test_rows, 60);
        assert_eq!(report.test_rows, 12);
        let evaluation = report.evaluation.unwrap();
        assert!(evaluation.accuracy > 0.8);
        assert_eq!(artifact.codec.labels(), &TriageLabel::ALL);
        assert_eq!(artifact.artifact_id, report.artifact_id);
    }

    #[test]
    fn should_refuse_a_single_class() {
        let records: Vec<RawRecord> = (0..5).map(|_| doc(json!({ "TriageGrade": 4 }))).collect();
        let err = train(&records, &quick()).unwrap_err();
        assert!(matches!(err, TriageError::TrainingError(_)));
    }

    #[test]
    fn should_refuse_unlabeled_input() {
        let records = vec![doc(json!({ "O2Saturation": 90 }))];
        assert!(matches!(train(&records, &quick()), Err(TriageError::TrainingError(_))));
    }

    #[tokio::test]
    async fn should_train_from_a_record_source() {
        let store = InMemoryStorage::new();
        for (i, record) in synthetic_records(30).into_iter().enumerate() {
            store.insert(format!("p-{:03}", i).parse().unwrap(), record).await;
        }
        let (_, report) = train_from_source(&store, Some(24), &quick()).await.unwrap();
        assert_eq!(report.fetched_rows, 24);
    }
}
