// lib/src/classifier/preprocess.rs
//
// Column preprocessing learned at fit time: numeric columns are median
// imputed then standardized, categorical columns are filled then one-hot
// encoded (unseen categories encode as all zeros), passthrough columns are
// copied as-is. Non-finite numbers are treated as missing.

use serde::{Deserialize, Serialize};

use models::{FeatureRow, FeatureSchema, FeatureValue, TriageError, TriageResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub median: f64,
    pub mean: f64,
    pub scale: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub fill: String,
    pub categories: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
    pub passthrough: Vec<String>,
}

fn column<'a>(row: &'a FeatureRow, name: &str) -> TriageResult<&'a FeatureValue> {
    row.get(name)
        .ok_or_else(|| TriageError::SchemaMismatch(format!("model input is missing column '{}'", name)))
}

fn numeric_value(row: &FeatureRow, name: &str) -> TriageResult<Option<f64>> {
    match column(row, name)? {
        FeatureValue::Number(v) if v.is_finite() => Ok(Some(*v)),
        FeatureValue::Number(_) | FeatureValue::Missing => Ok(None),
        FeatureValue::Text(_) => Err(TriageError::SchemaMismatch(format!(
            "column '{}' must be numeric",
            name
        ))),
    }
}

fn categorical_value(row: &FeatureRow, name: &str, fill: &str) -> TriageResult<String> {
    match column(row, name)? {
        FeatureValue::Text(s) if !s.is_empty() => Ok(s.clone()),
        FeatureValue::Text(_) | FeatureValue::Missing => Ok(fill.to_string()),
        FeatureValue::Number(_) => Err(TriageError::SchemaMismatch(format!(
            "column '{}' must be categorical",
            name
        ))),
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

impl Preprocessor {
    pub fn fit(rows: &[FeatureRow], schema: &FeatureSchema) -> TriageResult<Self> {
        if rows.is_empty() {
            return Err(TriageError::TrainingError("cannot fit preprocessing on zero rows".into()));
        }

        let mut numeric = Vec::with_capacity(schema.numeric.len());
        for name in &schema.numeric {
            let raw = rows
                .iter()
                .map(|row| numeric_value(row, name))
                .collect::<TriageResult<Vec<_>>>()?;
            let mut present: Vec<f64> = raw.iter().flatten().copied().collect();
            let median = median(&mut present).unwrap_or(0.0);
            let imputed: Vec<f64> = raw.iter().map(|v| v.unwrap_or(median)).collect();
            let n = imputed.len() as f64;
            let mean = imputed.iter().sum::<f64>() / n;
            let variance = imputed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            let scale = if std.is_finite() && std > f64::EPSILON { std } else { 1.0 };
            numeric.push(NumericColumn { name: name.clone(), median, mean, scale });
        }

        let fill = &schema.defaults.categorical_fill;
        let mut categorical = Vec::with_capacity(schema.categorical.len());
        for name in &schema.categorical {
            let mut categories = rows
                .iter()
                .map(|row| categorical_value(row, name, fill))
                .collect::<TriageResult<Vec<_>>>()?;
            categories.sort();
            categories.dedup();
            categorical.push(CategoricalColumn { name: name.clone(), fill: fill.clone(), categories });
        }

        for row in rows {
            for name in &schema.passthrough {
                passthrough_value(row, name)?;
            }
        }

        Ok(Self { numeric, categorical, passthrough: schema.passthrough.clone() })
    }

    /// Number of model input dimensions this preprocessor produces.
    pub fn width(&self) -> usize {
        self.numeric.len()
            + self.categorical.iter().map(|c| c.categories.len()).sum::<usize>()
            + self.passthrough.len()
    }

    pub fn transform_row(&self, row: &FeatureRow) -> TriageResult<Vec<f64>> {
        let mut out = Vec::with_capacity(self.width());
        for col in &self.numeric {
            let value = numeric_value(row, &col.name)?.unwrap_or(col.median);
            out.push((value - col.mean) / col.scale);
        }
        for col in &self.categorical {
            let value = categorical_value(row, &col.name, &col.fill)?;
            out.extend(col.categories.iter().map(|c| if *c == value { 1.0 } else { 0.0 }));
        }
        for name in &self.passthrough {
            out.push(passthrough_value(row, name)?);
        }
        Ok(out)
    }

    /// True when the learned columns are exactly the schema's declared lists.
    pub fn matches_schema(&self, schema: &FeatureSchema) -> bool {
        self.numeric.iter().map(|c| &c.name).eq(schema.numeric.iter())
            && self.categorical.iter().map(|c| &c.name).eq(schema.categorical.iter())
            && self.passthrough == schema.passthrough
    }
}

fn passthrough_value(row: &FeatureRow, name: &str) -> TriageResult<f64> {
    Ok(numeric_value(row, name)?.unwrap_or(0.0))
}
