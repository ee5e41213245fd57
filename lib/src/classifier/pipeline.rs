// lib/src/classifier/pipeline.rs
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use models::{FeatureRow, FeatureSchema, TriageResult};

use super::preprocess::Preprocessor;
use super::softmax::SoftmaxRegression;
use super::Classifier;

/// Hyperparameters for [`TriagePipeline::fit`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitParams {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self { epochs: 300, learning_rate: 0.1, l2: 1e-4 }
    }
}

/// Preprocessing followed by a softmax regression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriagePipeline {
    pub preprocessor: Preprocessor,
    pub model: SoftmaxRegression,
}

impl TriagePipeline {
    /// Fits on reconciled rows and their encoded targets.
    pub fn fit(rows: &[FeatureRow], targets: &[u32], schema: &FeatureSchema, params: FitParams) -> TriageResult<Self> {
        let preprocessor = Preprocessor::fit(rows, schema)?;
        let x = rows
            .par_iter()
            .map(|row| preprocessor.transform_row(row))
            .collect::<TriageResult<Vec<_>>>()?;
        let model = SoftmaxRegression::fit(&x, targets, params.epochs, params.learning_rate, params.l2)?;
        Ok(Self { preprocessor, model })
    }
}

impl Classifier for TriagePipeline {
    fn classes(&self) -> &[u32] {
        self.model.classes()
    }

    fn predict_proba(&self, rows: &[FeatureRow]) -> TriageResult<Vec<Vec<f64>>> {
        rows.par_iter()
            .map(|row| {
                let x = self.preprocessor.transform_row(row)?;
                self.model.predict_proba_row(&x)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::DefaultPolicy;

    fn schema() -> FeatureSchema {
        FeatureSchema {
            numeric: vec!["spo2".into()],
            categorical: vec!["ward".into()],
            passthrough: vec![],
            defaults: DefaultPolicy::default(),
        }
    }

    fn row(spo2: f64, ward: &str) -> FeatureRow {
        let mut row = FeatureRow::new();
        row.insert("spo2", spo2);
        row.insert("ward", ward);
        row
    }

    #[test]
    fn should_learn_a_simple_boundary() {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..30 {
            rows.push(row(80.0 + (i % 5) as f64, "A"));
            targets.push(0);
            rows.push(row(96.0 + (i % 4) as f64, "B"));
            targets.push(2);
        }
        let pipeline = TriagePipeline::fit(&rows, &targets, &schema(), FitParams::default()).unwrap();
        assert_eq!(pipeline.classes(), &[0, 2]);
        let predicted = pipeline.predict(&[row(81.0, "A"), row(98.0, "B")]).unwrap();
        assert_eq!(predicted, vec![0, 2]);
        let probs = pipeline.predict_proba(&[row(81.0, "A")]).unwrap();
        assert_eq!(probs[0].len(), 2);
    }
}
