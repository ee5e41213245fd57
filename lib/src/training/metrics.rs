// lib/src/training/metrics.rs
//
// Held-out evaluation: accuracy, per-class precision/recall/F1 and macro
// one-vs-rest ROC AUC. Probabilities are indexed by encoded class id.

use log::warn;
use serde::{Deserialize, Serialize};

use models::TriageLabel;

use crate::classifier::LabelCodec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: TriageLabel,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub rows: usize,
    pub accuracy: f64,
    pub per_class: Vec<ClassMetrics>,
    /// Absent when some class has no positive or no negative test rows.
    pub macro_auc: Option<f64>,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn evaluate(codec: &LabelCodec, truth: &[u32], predicted: &[u32], probabilities: &[Vec<f64>]) -> EvaluationReport {
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    let per_class = codec
        .labels()
        .iter()
        .enumerate()
        .map(|(id, label)| {
            let id = id as u32;
            let tp = truth.iter().zip(predicted).filter(|(t, p)| **t == id && **p == id).count();
            let predicted_pos = predicted.iter().filter(|p| **p == id).count();
            let support = truth.iter().filter(|t| **t == id).count();
            let precision = ratio(tp, predicted_pos);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 { 2.0 * precision * recall / (precision + recall) } else { 0.0 };
            ClassMetrics { label: *label, precision, recall, f1, support }
        })
        .collect();

    EvaluationReport {
        rows: truth.len(),
        accuracy: ratio(correct, truth.len()),
        per_class,
        macro_auc: macro_ovr_auc(codec, truth, probabilities),
    }
}

/// Mean of the per-class one-vs-rest AUCs over every class of the codec.
pub fn macro_ovr_auc(codec: &LabelCodec, truth: &[u32], probabilities: &[Vec<f64>]) -> Option<f64> {
    let mut total = 0.0;
    for id in 0..codec.len() {
        let scored: Option<Vec<(f64, bool)>> = truth
            .iter()
            .zip(probabilities)
            .map(|(t, probs)| probs.get(id).map(|p| (*p, *t as usize == id)))
            .collect();
        match scored.as_deref().and_then(binary_auc) {
            Some(auc) => total += auc,
            None => {
                warn!("ROC AUC not computed: class {} has no positive or no negative test rows", id);
                return None;
            }
        }
    }
    if codec.is_empty() {
        None
    } else {
        Some(total / codec.len() as f64)
    }
}

/// Rank-based (Mann-Whitney) AUC with average ranks for ties.
pub fn binary_auc(scored: &[(f64, bool)]) -> Option<f64> {
    let positives = scored.iter().filter(|(_, pos)| *pos).count();
    let negatives = scored.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }
    let mut order: Vec<usize> = (0..scored.len()).collect();
    order.sort_by(|a, b| scored[*a].0.total_cmp(&scored[*b].0));

    let mut rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && scored[order[end + 1]].0 == scored[order[start]].0 {
            end += 1;
        }
        let average_rank = (start + end) as f64 / 2.0 + 1.0;
        for i in &order[start..=end] {
            if scored[*i].1 {
                rank_sum += average_rank;
            }
        }
        start = end + 1;
    }
    let p = positives as f64;
    Some((rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> LabelCodec {
        LabelCodec::fit(&TriageLabel::ALL).unwrap()
    }

    #[test]
    fn should_compute_binary_auc() {
        assert_eq!(binary_auc(&[(0.9, true), (0.8, true), (0.2, false), (0.1, false)]), Some(1.0));
        assert_eq!(binary_auc(&[(0.1, true), (0.9, false)]), Some(0.0));
        assert_eq!(binary_auc(&[(0.5, true), (0.5, false)]), Some(0.5));
        assert_eq!(binary_auc(&[(0.5, true)]), None);
    }

    #[test]
    fn should_report_per_class_metrics() {
        let truth = vec![0, 0, 1, 2, 2, 2];
        let predicted = vec![0, 1, 1, 2, 2, 0];
        let probs = vec![
            vec![0.8, 0.1, 0.1],
            vec![0.3, 0.6, 0.1],
            vec![0.1, 0.8, 0.1],
            vec![0.1, 0.1, 0.8],
            vec![0.2, 0.1, 0.7],
            vec![0.5, 0.1, 0.4],
        ];
        let report = evaluate(&codec(), &truth, &predicted, &probs);
        assert_eq!(report.rows, 6);
        assert!((report.accuracy - 4.0 / 6.0).abs() < 1e-12);
        let emergency = &report.per_class[0];
        assert_eq!(emergency.label, TriageLabel::Emergency);
        assert_eq!(emergency.support, 2);
        assert!((emergency.precision - 0.5).abs() < 1e-12);
        assert!((emergency.recall - 0.5).abs() < 1e-12);
        assert!(report.macro_auc.is_some());
    }

    #[test]
    fn should_skip_auc_when_a_class_is_absent() {
        let truth = vec![0, 0, 2];
        let probs = vec![vec![0.7, 0.2, 0.1], vec![0.6, 0.3, 0.1], vec![0.1, 0.1, 0.8]];
        assert_eq!(macro_ovr_auc(&codec(), &truth, &probs), None);
    }
}
