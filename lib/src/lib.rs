// lib/src/lib.rs
//! The triage decision engine: feature contract, critical flags, classifier
//! adapter, decision combiner, training and serving.

pub mod classifier;
pub mod combiner;
pub mod config;
pub mod features;
pub mod flags;
pub mod labels;
pub mod normalizer;
pub mod schema;
pub mod service;
pub mod serving;
pub mod storage_engine;
pub mod training;

pub use models::{
    CriticalFlags, Decision, DecisionReason, DefaultPolicy, FeatureRecord, FeatureRow, FeatureSchema, QueueAction,
    RawRecord, RecordId, TriageError, TriageLabel, TriageResult, UpdateCounts, UpdateOutcome,
};

pub use crate::classifier::{Classifier, ClassifierAdapter, LabelCodec, ModelArtifact, Prediction, TriagePipeline};
pub use crate::combiner::{combine, DecisionThresholds};
pub use crate::config::TriageConfig;
pub use crate::features::{build_feature_record, build_features};
pub use crate::flags::evaluate_flags;
pub use crate::labels::{label_record, map_grade};
pub use crate::normalizer::normalize_number;
pub use crate::schema::reconcile_row;
pub use crate::service::TriageService;
pub use crate::serving::{HealthReport, ServingContext};
pub use crate::storage_engine::{
    open_sled_db, InMemoryStorage, JsonFileSource, QueueStore, RecordSource, SledQueueStore, SledRecordSource,
};
pub use crate::training::{train, train_from_source, TrainingReport};
