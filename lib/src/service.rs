// lib/src/service.rs
//
// Inference entry point: decisions for an ordered batch of raw records, plus
// the optional queue write-back per record.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use log::{debug, warn};
use rayon::prelude::*;

use models::{Decision, FeatureRow, RawRecord, RecordId, TriageError, TriageResult, UpdateOutcome};

use crate::combiner::combine;
use crate::features::build_features;
use crate::schema::reconcile_row;
use crate::serving::{HealthReport, ServingContext};
use crate::storage_engine::QueueStore;

/// Field carrying the id of the appointment a record belongs to.
pub const APPOINTMENT_ID_FIELD: &str = "appointment_id";

#[derive(Clone)]
pub struct TriageService {
    context: Arc<ServingContext>,
    store: Option<Arc<dyn QueueStore>>,
    update_timeout: Duration,
}

impl TriageService {
    pub fn new(context: Arc<ServingContext>, store: Option<Arc<dyn QueueStore>>, update_timeout: Duration) -> Self {
        Self { context, store, update_timeout }
    }

    pub fn context(&self) -> &ServingContext {
        &self.context
    }

    pub fn health(&self) -> HealthReport {
        self.context.health()
    }

    /// Decisions for `records`, index for index. Fails as a whole only when no
    /// model is loaded or the model/schema contract is broken.
    pub fn decide(&self, records: &[RawRecord]) -> TriageResult<Vec<Decision>> {
        let adapter = self.context.adapter()?;
        let schema = adapter.schema();
        let features = build_features(records, &schema.defaults);
        let rows = features
            .par_iter()
            .map(|record| reconcile_row(record.to_row(), schema))
            .collect::<TriageResult<Vec<FeatureRow>>>()?;
        let predictions = adapter.predict_batch(&rows)?;

        let thresholds = self.context.thresholds();
        Ok(features
            .into_iter()
            .zip(predictions)
            .map(|(record, prediction)| {
                let (queue_action, reason) =
                    combine(&record.flags, prediction.label, prediction.confidence, thresholds);
                Decision {
                    prediction: Some(prediction.label),
                    score: Some(prediction.confidence),
                    critical_flags: record.flags,
                    queue_action,
                    reason,
                    db_update: None,
                }
            })
            .collect())
    }

    /// Runs [`TriageService::decide`] and, when `apply_update` is set, moves
    /// each record's appointment to its new queue. Write-back failures are
    /// reported on the record and never fail the batch. Scoring runs on the
    /// blocking pool.
    pub async fn predict(&self, records: Vec<RawRecord>, apply_update: bool) -> TriageResult<Vec<Decision>> {
        let service = self.clone();
        let (records, decisions) = tokio::task::spawn_blocking(move || {
            let decisions = service.decide(&records);
            (records, decisions)
        })
        .await
        .map_err(|e| TriageError::InternalError(format!("decision task failed: {}", e)))?;
        let mut decisions = decisions?;
        if !apply_update {
            return Ok(decisions);
        }
        let outcomes = join_all(
            records
                .iter()
                .zip(decisions.iter())
                .map(|(record, decision)| self.write_back(record, decision)),
        )
        .await;
        for (decision, outcome) in decisions.iter_mut().zip(outcomes) {
            decision.db_update = outcome;
        }
        Ok(decisions)
    }

    async fn write_back(&self, record: &RawRecord, decision: &Decision) -> Option<UpdateOutcome> {
        let id = appointment_id(record)?;
        let Some(category) = decision.queue_action.queue_category() else {
            return Some(UpdateOutcome::skipped());
        };
        let Some(store) = &self.store else {
            return Some(UpdateOutcome::failed("no queue store configured"));
        };
        let outcome = match tokio::time::timeout(self.update_timeout, store.promote(&id, category, Utc::now())).await {
            Ok(Ok(counts)) => {
                debug!("Appointment {}: matched {}, modified {}", id, counts.matched, counts.modified);
                UpdateOutcome::Applied(counts)
            }
            Ok(Err(e)) => {
                warn!("Queue update for appointment {} failed: {}", id, e);
                UpdateOutcome::failed(e.to_string())
            }
            Err(_) => {
                warn!("Queue update for appointment {} timed out after {:?}", id, self.update_timeout);
                UpdateOutcome::failed(format!("update timed out after {} ms", self.update_timeout.as_millis()))
            }
        };
        Some(outcome)
    }
}

/// The record's appointment id, if it carries a usable one.
pub fn appointment_id(record: &RawRecord) -> Option<RecordId> {
    record.get(APPOINTMENT_ID_FIELD).and_then(RecordId::from_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::adapter::tests::FixedClassifier;
    use crate::classifier::{ClassifierAdapter, LabelCodec};
    use crate::combiner::DecisionThresholds;
    use crate::storage_engine::InMemoryStorage;
    use async_trait::async_trait;
    use chrono::DateTime;
    use serde_json::Value;
    use crate::classifier::Classifier;
    use models::{DefaultPolicy, FeatureSchema, QueueAction, QueueCategory, TriageLabel, UpdateCounts};
    use std::sync::Mutex;
    use std::thread::{self, ThreadId};
    use serde_json::json;
    use uuid::Uuid;

    fn doc(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn context_with(classes: Vec<u32>, probabilities: Vec<f64>) -> Arc<ServingContext> {
        let adapter = ClassifierAdapter::new(
            Arc::new(FixedClassifier { classes, probabilities }),
            LabelCodec::fit(&TriageLabel::ALL).unwrap(),
            FeatureSchema::canonical(DefaultPolicy::default()),
        )
        .unwrap();
        Arc::new(ServingContext::from_adapter(adapter, Uuid::nil(), Utc::now(), DecisionThresholds::default()))
    }

    struct StalledStore;

    #[async_trait]
    impl QueueStore for StalledStore {
        async fn promote(&self, _: &RecordId, _: QueueCategory, _: DateTime<Utc>) -> TriageResult<UpdateCounts> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(UpdateCounts::default())
        }

        fn get_type(&self) -> &'static str {
            "Stalled"
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl QueueStore for BrokenStore {
        async fn promote(&self, _: &RecordId, _: QueueCategory, _: DateTime<Utc>) -> TriageResult<UpdateCounts> {
            Err(TriageError::PersistenceUpdate("connection reset".into()))
        }

        fn get_type(&self) -> &'static str {
            "Broken"
        }
    }

    /// Remembers the thread that ran inference.
    struct ThreadRecordingClassifier {
        inner: FixedClassifier,
        seen: Mutex<Option<ThreadId>>,
    }

    impl Classifier for ThreadRecordingClassifier {
        fn classes(&self) -> &[u32] {
            self.inner.classes()
        }

        fn predict_proba(&self, rows: &[FeatureRow]) -> TriageResult<Vec<Vec<f64>>> {
            if let Ok(mut seen) = self.seen.lock() {
                *seen = Some(thread::current().id());
            }
            self.inner.predict_proba(rows)
        }
    }

    #[tokio::test]
    async fn should_run_inference_off_the_async_worker() {
        let classifier = Arc::new(ThreadRecordingClassifier {
            inner: FixedClassifier { classes: vec![0, 1, 2], probabilities: vec![0.1, 0.1, 0.8] },
            seen: Mutex::new(None),
        });
        let adapter = ClassifierAdapter::new(
            classifier.clone(),
            LabelCodec::fit(&TriageLabel::ALL).unwrap(),
            FeatureSchema::canonical(DefaultPolicy::default()),
        )
        .unwrap();
        let context =
            Arc::new(ServingContext::from_adapter(adapter, Uuid::nil(), Utc::now(), DecisionThresholds::default()));
        let service = TriageService::new(context, None, Duration::from_secs(1));

        let decisions = service.predict(vec![doc(json!({ "O2Saturation": 97 }))], false).await.unwrap();
        assert_eq!(decisions[0].prediction, Some(TriageLabel::Routine));
        let seen = classifier.seen.lock().unwrap().expect("classifier was not called");
        assert_ne!(seen, thread::current().id());
    }

    #[test]
    fn should_fail_whole_batch_without_a_model() {
        let context = Arc::new(ServingContext::unavailable("no file", DecisionThresholds::default()));
        let service = TriageService::new(context, None, Duration::from_millis(100));
        let err = service.decide(&[RawRecord::new()]).unwrap_err();
        assert!(matches!(err, TriageError::ModelUnavailable(_)));
    }

    #[test]
    fn should_let_flags_override_a_routine_prediction() {
        // Routine at 0.9, columns in codec order
        let service = TriageService::new(context_with(vec![0, 1, 2], vec![0.05, 0.05, 0.9]), None, Duration::from_secs(1));
        let decisions = service.decide(&[doc(json!({ "O2Saturation": 85 })), doc(json!({ "O2Saturation": 97 }))]).unwrap();
        assert_eq!(decisions[0].queue_action, QueueAction::PromoteToEmergency);
        assert_eq!(decisions[0].prediction, Some(TriageLabel::Routine));
        assert_eq!(decisions[0].score, Some(0.9));
        assert!(decisions[0].critical_flags.spo2_crit);
        assert_eq!(decisions[1].queue_action, QueueAction::None);
    }

    #[tokio::test]
    async fn should_write_back_promotions_only() {
        let store = InMemoryStorage::new();
        let id: RecordId = "a-1".parse().unwrap();
        store.insert(id.clone(), RawRecord::new()).await;
        let service = TriageService::new(
            context_with(vec![1, 0, 2], vec![0.2, 0.7, 0.1]),
            Some(Arc::new(store.clone())),
            Duration::from_secs(1),
        );
        let records = vec![
            doc(json!({ "appointment_id": "a-1" })),
            doc(json!({ "appointment_id": { "$oid": "a-2" } })),
            doc(json!({})),
        ];
        let decisions = service.predict(records, true).await.unwrap();
        // HighRisk at 0.2 in column 0, Emergency at 0.7 in column 1
        assert_eq!(decisions[0].prediction, Some(TriageLabel::Emergency));
        assert_eq!(decisions[0].db_update, Some(UpdateOutcome::Applied(UpdateCounts { matched: 1, modified: 1 })));
        assert_eq!(decisions[1].db_update, Some(UpdateOutcome::Applied(UpdateCounts::default())));
        assert_eq!(decisions[2].db_update, None);
        assert_eq!(store.get(&id).await.unwrap()["queue"], "emergency");
    }

    #[tokio::test]
    async fn should_skip_store_for_no_action() {
        let service = TriageService::new(
            context_with(vec![0, 1, 2], vec![0.1, 0.1, 0.8]),
            Some(Arc::new(BrokenStore)),
            Duration::from_secs(1),
        );
        let decisions = service.predict(vec![doc(json!({ "appointment_id": 17 }))], true).await.unwrap();
        assert_eq!(decisions[0].db_update, Some(UpdateOutcome::skipped()));
    }

    #[tokio::test]
    async fn should_annotate_failed_updates_without_failing_the_batch() {
        let records = vec![
            doc(json!({ "appointment_id": "x", "O2Saturation": 80 })),
            doc(json!({ "O2Saturation": 80 })),
        ];
        let broken = TriageService::new(
            context_with(vec![0, 1, 2], vec![0.1, 0.1, 0.8]),
            Some(Arc::new(BrokenStore)),
            Duration::from_secs(1),
        );
        let decisions = broken.predict(records.clone(), true).await.unwrap();
        assert_eq!(decisions.len(), 2);
        assert!(decisions[0].db_update.as_ref().unwrap().is_failed());
        assert_eq!(decisions[0].queue_action, QueueAction::PromoteToEmergency);
        assert_eq!(decisions[1].db_update, None);

        let stalled = TriageService::new(
            context_with(vec![0, 1, 2], vec![0.1, 0.1, 0.8]),
            Some(Arc::new(StalledStore)),
            Duration::from_millis(20),
        );
        let decisions = stalled.predict(records, true).await.unwrap();
        match decisions[0].db_update.as_ref().unwrap() {
            UpdateOutcome::Failed { error, .. } => assert!(error.contains("timed out")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn should_not_touch_the_store_unless_asked() {
        let service = TriageService::new(
            context_with(vec![0, 1, 2], vec![0.9, 0.05, 0.05]),
            Some(Arc::new(BrokenStore)),
            Duration::from_secs(1),
        );
        let decisions = service.predict(vec![doc(json!({ "appointment_id": "x" }))], false).await.unwrap();
        assert_eq!(decisions[0].db_update, None);
    }

    #[test]
    fn should_read_appointment_ids() {
        assert!(appointment_id(&doc(json!({ "appointment_id": { "$oid": "65f0" } }))).is_some());
        assert!(appointment_id(&doc(json!({ "appointment_id": "" }))).is_none());
        assert!(appointment_id(&doc(json!({}))).is_none());
    }
}
