// models/src/medical/triage.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TriageError;
use crate::medical::flags::CriticalFlags;

/// Human-readable triage label. Declaration order is alphabetical, which is
/// also the label codec's encoding order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TriageLabel {
    Emergency,
    HighRisk,
    Routine,
}

impl TriageLabel {
    pub const ALL: [TriageLabel; 3] = [TriageLabel::Emergency, TriageLabel::HighRisk, TriageLabel::Routine];

    pub fn as_str(self) -> &'static str {
        match self {
            TriageLabel::Emergency => "Emergency",
            TriageLabel::HighRisk => "HighRisk",
            TriageLabel::Routine => "Routine",
        }
    }
}

impl fmt::Display for TriageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriageLabel {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Emergency" => Ok(TriageLabel::Emergency),
            "HighRisk" => Ok(TriageLabel::HighRisk),
            "Routine" => Ok(TriageLabel::Routine),
            other => Err(TriageError::InvalidData(format!("Unknown triage label: {}", other))),
        }
    }
}

/// The queue action exposed to callers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueAction {
    #[default]
    None,
    PromoteToHighRisk,
    PromoteToEmergency,
}

impl QueueAction {
    /// The queue an appointment is moved to, if any.
    pub fn queue_category(self) -> Option<QueueCategory> {
        match self {
            QueueAction::None => None,
            QueueAction::PromoteToHighRisk => Some(QueueCategory::HighRisk),
            QueueAction::PromoteToEmergency => Some(QueueCategory::Emergency),
        }
    }
}

impl fmt::Display for QueueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueueAction::None => "none",
            QueueAction::PromoteToHighRisk => "promote_to_high_risk",
            QueueAction::PromoteToEmergency => "promote_to_emergency",
        })
    }
}

/// Value written to an appointment's `queue` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueCategory {
    Emergency,
    HighRisk,
}

impl QueueCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            QueueCategory::Emergency => "emergency",
            QueueCategory::HighRisk => "high_risk",
        }
    }
}

/// Which rule of the combiner produced the action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    CriticalFlag,
    ClassifierEmergency,
    ClassifierHighRisk,
    BelowThreshold,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCounts {
    pub matched: u64,
    pub modified: u64,
}

/// Result of the optional write-back for one record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdateOutcome {
    Applied(UpdateCounts),
    Failed { failed: bool, error: String },
}

impl UpdateOutcome {
    pub fn skipped() -> Self {
        UpdateOutcome::Applied(UpdateCounts::default())
    }

    pub fn failed(error: impl Into<String>) -> Self {
        UpdateOutcome::Failed { failed: true, error: error.into() }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UpdateOutcome::Failed { .. })
    }
}

/// The per-record answer of the inference entry point.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Decision {
    pub prediction: Option<TriageLabel>,
    pub score: Option<f64>,
    pub critical_flags: CriticalFlags,
    pub queue_action: QueueAction,
    pub reason: DecisionReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_update: Option<UpdateOutcome>,
}
