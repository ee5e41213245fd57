// lib/src/classifier/softmax.rs
//
// Multinomial logistic regression trained with full-batch gradient descent.

use log::debug;
use serde::{Deserialize, Serialize};

use models::{TriageError, TriageResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxRegression {
    /// Encoded ids in order of first appearance in the training targets.
    classes: Vec<u32>,
    /// One row per class: input weights followed by the bias.
    weights: Vec<Vec<f64>>,
}

fn softmax(logits: &mut [f64]) {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in logits.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in logits.iter_mut() {
        *v /= sum;
    }
}

impl SoftmaxRegression {
    pub fn fit(x: &[Vec<f64>], y: &[u32], epochs: usize, learning_rate: f64, l2: f64) -> TriageResult<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(TriageError::TrainingError(format!(
                "expected matching non-empty inputs, got {} rows and {} targets",
                x.len(),
                y.len()
            )));
        }
        let width = x[0].len();
        if x.iter().any(|row| row.len() != width) {
            return Err(TriageError::TrainingError("training rows have inconsistent widths".into()));
        }

        let mut classes: Vec<u32> = Vec::new();
        for id in y {
            if !classes.contains(id) {
                classes.push(*id);
            }
        }
        let targets: Vec<usize> = y
            .iter()
            .map(|id| classes.iter().position(|c| c == id).unwrap_or_default())
            .collect();

        let k = classes.len();
        let n = x.len() as f64;
        let mut weights = vec![vec![0.0; width + 1]; k];

        for epoch in 0..epochs {
            let mut grad = vec![vec![0.0; width + 1]; k];
            let mut loss = 0.0;
            for (row, target) in x.iter().zip(&targets) {
                let mut probs = Self::logits(&weights, row);
                softmax(&mut probs);
                loss -= probs[*target].max(1e-12).ln();
                for (c, p) in probs.iter().enumerate() {
                    let err = p - if c == *target { 1.0 } else { 0.0 };
                    for (j, v) in row.iter().enumerate() {
                        grad[c][j] += err * v;
                    }
                    grad[c][width] += err;
                }
            }
            for (w, g) in weights.iter_mut().zip(&grad) {
                for j in 0..=width {
                    let penalty = if j < width { l2 * w[j] } else { 0.0 };
                    w[j] -= learning_rate * (g[j] / n + penalty);
                }
            }
            if epoch % 50 == 0 {
                debug!("epoch {}: mean log loss {:.5}", epoch, loss / n);
            }
        }

        Ok(Self { classes, weights })
    }

    fn logits(weights: &[Vec<f64>], row: &[f64]) -> Vec<f64> {
        weights
            .iter()
            .map(|w| match w.split_last() {
                Some((bias, input)) => input.iter().zip(row).map(|(a, b)| a * b).sum::<f64>() + bias,
                None => 0.0,
            })
            .collect()
    }

    pub fn classes(&self) -> &[u32] {
        &self.classes
    }

    pub fn input_width(&self) -> usize {
        self.weights.first().map(|w| w.len().saturating_sub(1)).unwrap_or(0)
    }

    pub fn predict_proba_row(&self, row: &[f64]) -> TriageResult<Vec<f64>> {
        if row.len() != self.input_width() {
            return Err(TriageError::SchemaMismatch(format!(
                "model expects {} inputs, got {}",
                self.input_width(),
                row.len()
            )));
        }
        let mut probs = Self::logits(&self.weights, row);
        softmax(&mut probs);
        Ok(probs)
    }
}
