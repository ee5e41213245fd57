// lib/tests/decision_scenarios.rs
//
// End-to-end decision scenarios through the public API, with a scripted
// classifier standing in for a trained one.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use lib::{
    build_features, label_record, Classifier, ClassifierAdapter, DecisionReason, DecisionThresholds, DefaultPolicy,
    FeatureRow, FeatureSchema, LabelCodec, QueueAction, RawRecord, ServingContext, TriageLabel, TriageResult,
    TriageService,
};

/// Answers every row with the same probabilities; classes are given in the
/// order the probability columns use.
struct Scripted {
    classes: Vec<u32>,
    probabilities: Vec<f64>,
}

impl Classifier for Scripted {
    fn classes(&self) -> &[u32] {
        &self.classes
    }

    fn predict_proba(&self, rows: &[FeatureRow]) -> TriageResult<Vec<Vec<f64>>> {
        Ok(rows.iter().map(|_| self.probabilities.clone()).collect())
    }
}

fn doc(value: Value) -> RawRecord {
    value.as_object().cloned().unwrap()
}

fn service(label: TriageLabel, confidence: f64) -> TriageService {
    let _ = env_logger::builder().is_test(true).try_init();
    // Columns deliberately in reverse codec order: Routine, HighRisk, Emergency.
    let classes = vec![2, 1, 0];
    let rest = (1.0 - confidence) / 2.0;
    let probabilities = classes
        .iter()
        .map(|id| if *id == label as u32 { confidence } else { rest })
        .collect();
    let adapter = ClassifierAdapter::new(
        Arc::new(Scripted { classes, probabilities }),
        LabelCodec::fit(&TriageLabel::ALL).unwrap(),
        FeatureSchema::canonical(DefaultPolicy::default()),
    )
    .unwrap();
    let context = ServingContext::from_adapter(adapter, Uuid::new_v4(), Utc::now(), DecisionThresholds::default());
    TriageService::new(Arc::new(context), None, Duration::from_millis(500))
}

fn normal_vitals() -> RawRecord {
    doc(json!({
        "BloodPressureSystolic": 120, "BloodPressureDiastolic": 80, "PulseRate": 72,
        "RespiratoryRate": 16, "Temperature": 36.8, "O2Saturation": 98, "AVPU": 1,
        "age": 44, "gender": "F", "chiefComplaint": "headache"
    }))
}

#[test]
fn should_override_routine_prediction_on_low_saturation() {
    let mut record = normal_vitals();
    record.insert("O2Saturation".into(), json!({ "$numberDouble": "85" }));
    let decision = service(TriageLabel::Routine, 0.9).decide(&[record]).unwrap().remove(0);
    assert_eq!(decision.queue_action, QueueAction::PromoteToEmergency);
    assert_eq!(decision.reason, DecisionReason::CriticalFlag);
    assert_eq!(decision.prediction, Some(TriageLabel::Routine));
    assert!((decision.score.unwrap() - 0.9).abs() < 1e-12);
}

#[test]
fn should_promote_confident_emergency_prediction() {
    let decision = service(TriageLabel::Emergency, 0.6).decide(&[normal_vitals()]).unwrap().remove(0);
    assert!(!decision.critical_flags.any());
    assert_eq!(decision.queue_action, QueueAction::PromoteToEmergency);
    assert_eq!(decision.reason, DecisionReason::ClassifierEmergency);
}

#[test]
fn should_ignore_unconfident_high_risk_prediction() {
    // 0.4 against 0.3 for the others: HighRisk still wins the argmax
    let decision = service(TriageLabel::HighRisk, 0.4).decide(&[normal_vitals()]).unwrap().remove(0);
    assert_eq!(decision.prediction, Some(TriageLabel::HighRisk));
    assert_eq!(decision.queue_action, QueueAction::None);
}

#[test]
fn should_decide_empty_records_from_the_classifier_alone() {
    let empty = RawRecord::new();
    let features = build_features(std::slice::from_ref(&empty), &DefaultPolicy::default());
    assert!(features[0].vitals.iter().all(|(_, v)| v.is_none()));
    assert_eq!(features[0].gender, "Unknown");
    assert_eq!(features[0].chief_complaint, "Unknown");
    assert!(!features[0].flags.any());

    let decision = service(TriageLabel::HighRisk, 0.7).decide(&[empty]).unwrap().remove(0);
    assert_eq!(decision.queue_action, QueueAction::PromoteToHighRisk);
}

#[test]
fn should_map_grades_for_training() {
    let graded = |grade: Value| label_record(&doc(json!({ "TriageGrade": grade })));
    assert_eq!(graded(json!(2)), Some(TriageLabel::Emergency));
    assert_eq!(graded(json!(3)), Some(TriageLabel::HighRisk));
    assert_eq!(graded(json!(4)), Some(TriageLabel::Routine));
    assert_eq!(label_record(&normal_vitals()), None);
}

#[test]
fn should_preserve_batch_order() {
    let batch: Vec<RawRecord> = (0..40)
        .map(|i| {
            let mut record = normal_vitals();
            if i % 3 == 0 {
                record.insert("PulseRate".into(), json!(150));
            }
            record
        })
        .collect();
    let decisions = service(TriageLabel::Routine, 0.8).decide(&batch).unwrap();
    assert_eq!(decisions.len(), batch.len());
    for (i, decision) in decisions.iter().enumerate() {
        assert_eq!(decision.critical_flags.hr_high_crit, i % 3 == 0, "record {}", i);
    }
}

#[test]
fn should_build_identical_features_twice() {
    let batch = vec![normal_vitals(), RawRecord::new(), doc(json!({ "BlooddpressurSystol": "85" }))];
    let policy = DefaultPolicy::default();
    assert_eq!(build_features(&batch, &policy), build_features(&batch, &policy));
}
