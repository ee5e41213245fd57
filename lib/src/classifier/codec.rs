// lib/src/classifier/codec.rs
use serde::{Deserialize, Serialize};

use models::{TriageError, TriageLabel, TriageResult};

/// Bidirectional mapping between encoded class ids and triage labels.
/// Encoded id `i` is the i-th label in sorted order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCodec {
    classes: Vec<TriageLabel>,
}

impl LabelCodec {
    pub fn fit(labels: &[TriageLabel]) -> TriageResult<Self> {
        let mut classes = labels.to_vec();
        classes.sort();
        classes.dedup();
        if classes.is_empty() {
            return Err(TriageError::TrainingError("cannot fit a label codec on zero labels".into()));
        }
        Ok(Self { classes })
    }

    pub fn from_classes(classes: Vec<TriageLabel>) -> TriageResult<Self> {
        let mut sorted = classes.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != classes.len() || classes.is_empty() {
            return Err(TriageError::SchemaMismatch(format!("invalid label codec classes: {:?}", classes)));
        }
        Ok(Self { classes })
    }

    pub fn encode(&self, label: TriageLabel) -> TriageResult<u32> {
        self.classes
            .iter()
            .position(|c| *c == label)
            .map(|i| i as u32)
            .ok_or_else(|| TriageError::SchemaMismatch(format!("label {} is not known to the codec", label)))
    }

    pub fn encode_all(&self, labels: &[TriageLabel]) -> TriageResult<Vec<u32>> {
        labels.iter().map(|l| self.encode(*l)).collect()
    }

    pub fn decode(&self, id: u32) -> TriageResult<TriageLabel> {
        self.classes
            .get(id as usize)
            .copied()
            .ok_or_else(|| TriageError::SchemaMismatch(format!("encoded class {} is not known to the codec", id)))
    }

    pub fn labels(&self) -> &[TriageLabel] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_encode_in_sorted_label_order() {
        let codec = LabelCodec::fit(&[TriageLabel::Routine, TriageLabel::Emergency, TriageLabel::Routine]).unwrap();
        assert_eq!(codec.labels(), &[TriageLabel::Emergency, TriageLabel::Routine]);
        assert_eq!(codec.encode(TriageLabel::Emergency).unwrap(), 0);
        assert_eq!(codec.encode(TriageLabel::Routine).unwrap(), 1);
        assert_eq!(codec.decode(1).unwrap(), TriageLabel::Routine);
    }

    #[test]
    fn should_reject_unknown_ids_and_labels() {
        let codec = LabelCodec::fit(&[TriageLabel::HighRisk]).unwrap();
        assert!(codec.decode(3).is_err());
        assert!(codec.encode(TriageLabel::Emergency).is_err());
    }

    #[test]
    fn should_not_fit_on_nothing() {
        assert!(matches!(LabelCodec::fit(&[]), Err(TriageError::TrainingError(_))));
    }
}
