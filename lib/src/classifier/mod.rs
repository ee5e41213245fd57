// lib/src/classifier/mod.rs
//
// The classifier is an opaque capability: something that maps reconciled
// feature rows to a probability vector over its own encoded class ids.

pub mod adapter;
pub mod artifact;
pub mod codec;
pub mod pipeline;
pub mod preprocess;
pub mod softmax;

pub use adapter::{ClassifierAdapter, Prediction};
pub use artifact::{ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use codec::LabelCodec;
pub use pipeline::{FitParams, TriagePipeline};

use models::{FeatureRow, TriageError, TriageResult};

pub trait Classifier: Send + Sync {
    /// Encoded class ids in the order of the probability columns. This order is
    /// the classifier's own and need not match the label codec's.
    fn classes(&self) -> &[u32];

    /// One probability vector per row, columns ordered as [`Classifier::classes`].
    fn predict_proba(&self, rows: &[FeatureRow]) -> TriageResult<Vec<Vec<f64>>>;

    /// Encoded id of the most probable class for each row. Ties go to the
    /// earliest column.
    fn predict(&self, rows: &[FeatureRow]) -> TriageResult<Vec<u32>> {
        let classes = self.classes();
        self.predict_proba(rows)?
            .iter()
            .map(|probs| {
                argmax(probs)
                    .and_then(|i| classes.get(i).copied())
                    .ok_or_else(|| TriageError::InternalError("classifier returned an empty probability vector".into()))
            })
            .collect()
    }
}

pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().copied().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
