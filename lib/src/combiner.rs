// lib/src/combiner.rs
//
// Merges the classifier's answer with the safety flags into one queue action.
// Flags always win; the classifier can only promote when it is confident.

use serde::{Deserialize, Serialize};

use models::{CriticalFlags, DecisionReason, QueueAction, TriageLabel, ValidationError};

pub const DEFAULT_EMERGENCY_THRESHOLD: f64 = 0.5;
pub const DEFAULT_HIGH_RISK_THRESHOLD: f64 = 0.5;

/// Minimum classifier confidence needed to promote a record.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    pub emergency: f64,
    pub high_risk: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self { emergency: DEFAULT_EMERGENCY_THRESHOLD, high_risk: DEFAULT_HIGH_RISK_THRESHOLD }
    }
}

impl DecisionThresholds {
    pub fn new(emergency: f64, high_risk: f64) -> Result<Self, ValidationError> {
        let thresholds = Self { emergency, high_risk };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [("emergency", self.emergency), ("high_risk", self.high_risk)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::OutOfUnitRange(value, name.to_string()));
            }
        }
        Ok(())
    }
}

/// Decides the queue action for one record.
///
/// Rules, first match wins:
/// 1. any critical flag raised: promote to emergency
/// 2. predicted Emergency with confidence >= `thresholds.emergency`: promote to emergency
/// 3. predicted HighRisk with confidence >= `thresholds.high_risk`: promote to high risk
/// 4. otherwise no action
pub fn combine(
    flags: &CriticalFlags,
    label: TriageLabel,
    confidence: f64,
    thresholds: &DecisionThresholds,
) -> (QueueAction, DecisionReason) {
    if flags.any() {
        return (QueueAction::PromoteToEmergency, DecisionReason::CriticalFlag);
    }
    match label {
        TriageLabel::Emergency if confidence >= thresholds.emergency => {
            (QueueAction::PromoteToEmergency, DecisionReason::ClassifierEmergency)
        }
        TriageLabel::HighRisk if confidence >= thresholds.high_risk => {
            (QueueAction::PromoteToHighRisk, DecisionReason::ClassifierHighRisk)
        }
        _ => (QueueAction::None, DecisionReason::BelowThreshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn flagged() -> CriticalFlags {
        CriticalFlags { spo2_crit: true, ..CriticalFlags::default() }
    }

    #[test]
    fn should_promote_on_any_flag() {
        let t = DecisionThresholds::default();
        for label in TriageLabel::ALL {
            assert_eq!(
                combine(&flagged(), label, 0.0, &t),
                (QueueAction::PromoteToEmergency, DecisionReason::CriticalFlag)
            );
        }
    }

    #[test]
    fn should_promote_confident_classifier_answers() {
        let t = DecisionThresholds::default();
        let none = CriticalFlags::default();
        assert_eq!(combine(&none, TriageLabel::Emergency, 0.5, &t).0, QueueAction::PromoteToEmergency);
        assert_eq!(combine(&none, TriageLabel::HighRisk, 0.81, &t).0, QueueAction::PromoteToHighRisk);
        assert_eq!(combine(&none, TriageLabel::Emergency, 0.49, &t).0, QueueAction::None);
        assert_eq!(combine(&none, TriageLabel::Routine, 0.99, &t).0, QueueAction::None);
    }

    #[test]
    fn should_honor_custom_thresholds() {
        let t = DecisionThresholds::new(0.9, 0.3).unwrap();
        let none = CriticalFlags::default();
        assert_eq!(combine(&none, TriageLabel::Emergency, 0.85, &t).0, QueueAction::None);
        assert_eq!(combine(&none, TriageLabel::HighRisk, 0.31, &t).0, QueueAction::PromoteToHighRisk);
    }

    #[test]
    fn should_reject_thresholds_outside_unit_range() {
        assert!(DecisionThresholds::new(1.2, 0.5).is_err());
        assert!(DecisionThresholds::new(0.5, -0.1).is_err());
        assert!(DecisionThresholds::new(f64::NAN, 0.5).is_err());
        assert!(DecisionThresholds::new(0.0, 1.0).is_ok());
    }

    fn any_flags() -> impl Strategy<Value = CriticalFlags> {
        proptest::collection::vec(any::<bool>(), 7).prop_map(|b| CriticalFlags {
            spo2_crit: b[0],
            sbp_low_crit: b[1],
            sbp_high_crit: b[2],
            hr_low_crit: b[3],
            hr_high_crit: b[4],
            rr_crit: b[5],
            temp_crit: b[6],
        })
    }

    fn any_label() -> impl Strategy<Value = TriageLabel> {
        prop_oneof![Just(TriageLabel::Emergency), Just(TriageLabel::HighRisk), Just(TriageLabel::Routine)]
    }

    proptest! {
        #[test]
        fn should_follow_priority_order(
            flags in any_flags(),
            label in any_label(),
            confidence in 0.0f64..=1.0,
            emergency in 0.0f64..=1.0,
            high_risk in 0.0f64..=1.0,
        ) {
            let t = DecisionThresholds { emergency, high_risk };
            let (action, reason) = combine(&flags, label, confidence, &t);
            if flags.any() {
                prop_assert_eq!(action, QueueAction::PromoteToEmergency);
                prop_assert_eq!(reason, DecisionReason::CriticalFlag);
            } else if label == TriageLabel::Routine {
                prop_assert_eq!(action, QueueAction::None);
            } else if action == QueueAction::None {
                let limit = if label == TriageLabel::Emergency { emergency } else { high_risk };
                prop_assert!(confidence < limit);
            }
        }
    }
}
