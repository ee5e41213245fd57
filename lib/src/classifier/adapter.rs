// lib/src/classifier/adapter.rs
//
// Reconciles the classifier's encoded class ids with its probability columns
// and with the label codec. The id -> column lookup is built once, when the
// adapter is constructed, and never assumed positional.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use models::{FeatureRow, FeatureSchema, TriageError, TriageLabel, TriageResult};

use super::{argmax, Classifier, LabelCodec};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    pub encoded: u32,
    pub label: TriageLabel,
    /// Probability of the predicted class.
    pub confidence: f64,
    /// Probabilities indexed by encoded class id.
    pub probabilities: Vec<f64>,
}

pub struct ClassifierAdapter {
    classifier: Arc<dyn Classifier>,
    codec: LabelCodec,
    schema: FeatureSchema,
    class_index: HashMap<u32, usize>,
}

impl fmt::Debug for ClassifierAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierAdapter")
            .field("codec", &self.codec)
            .field("schema", &self.schema)
            .field("class_index", &self.class_index)
            .finish()
    }
}

impl ClassifierAdapter {
    pub fn new(classifier: Arc<dyn Classifier>, codec: LabelCodec, schema: FeatureSchema) -> TriageResult<Self> {
        schema.validate()?;
        let classes = classifier.classes();
        if classes.is_empty() {
            return Err(TriageError::SchemaMismatch("classifier exposes no classes".into()));
        }
        let mut class_index = HashMap::with_capacity(classes.len());
        for (position, id) in classes.iter().enumerate() {
            codec.decode(*id)?;
            if class_index.insert(*id, position).is_some() {
                return Err(TriageError::SchemaMismatch(format!("classifier lists class {} twice", id)));
            }
        }
        Ok(Self { classifier, codec, schema, class_index })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn codec(&self) -> &LabelCodec {
        &self.codec
    }

    /// Probability column of an encoded class id.
    pub fn column_of(&self, encoded: u32) -> Option<usize> {
        self.class_index.get(&encoded).copied()
    }

    /// Predicted encoded id and the probability vector re-indexed by encoded id.
    pub fn predict_encoded(&self, rows: &[FeatureRow]) -> TriageResult<Vec<(u32, Vec<f64>)>> {
        let probabilities = self.classifier.predict_proba(rows)?;
        if probabilities.len() != rows.len() {
            return Err(TriageError::InternalError(format!(
                "classifier answered {} probability rows for {} inputs",
                probabilities.len(),
                rows.len()
            )));
        }
        let classes = self.classifier.classes();
        probabilities
            .into_iter()
            .map(|raw| {
                if raw.len() != classes.len() {
                    return Err(TriageError::SchemaMismatch(format!(
                        "probability vector has {} columns, classifier declares {}",
                        raw.len(),
                        classes.len()
                    )));
                }
                let encoded = argmax(&raw).and_then(|i| classes.get(i).copied()).ok_or_else(|| {
                    TriageError::InternalError("classifier returned an empty probability vector".into())
                })?;
                let mut by_id = vec![0.0; self.codec.len()];
                for (id, column) in &self.class_index {
                    by_id[*id as usize] = raw[*column];
                }
                Ok((encoded, by_id))
            })
            .collect()
    }

    pub fn predict_batch(&self, rows: &[FeatureRow]) -> TriageResult<Vec<Prediction>> {
        self.predict_encoded(rows)?
            .into_iter()
            .map(|(encoded, probabilities)| {
                Ok(Prediction {
                    encoded,
                    label: self.codec.decode(encoded)?,
                    confidence: probabilities[encoded as usize],
                    probabilities,
                })
            })
            .collect()
    }

    pub fn predict_one(&self, row: FeatureRow) -> TriageResult<Prediction> {
        self.predict_batch(std::slice::from_ref(&row))?
            .pop()
            .ok_or_else(|| TriageError::InternalError("classifier returned no prediction".into()))
    }
}
