// lib/src/schema.rs
//
// Schema reconciliation: make a feature row expose every column the trained
// classifier declares. Columns the schema does not list are left in place.

use log::debug;

use models::{FeatureRow, FeatureSchema, FeatureValue, TriageError, TriageResult};

pub fn reconcile_row(mut row: FeatureRow, schema: &FeatureSchema) -> TriageResult<FeatureRow> {
    if schema.numeric.is_empty() && schema.categorical.is_empty() {
        return Err(TriageError::SchemaMismatch(
            "classifier declares no input features to reconcile against".to_string(),
        ));
    }
    for name in &schema.numeric {
        match row.get(name) {
            None => {
                row.insert_if_absent(name, schema.defaults.numeric_default());
                debug!("Inserted missing numeric column '{}'", name);
            }
            Some(FeatureValue::Text(_)) => {
                return Err(TriageError::SchemaMismatch(format!(
                    "column '{}' is declared numeric but carries text",
                    name
                )));
            }
            Some(_) => {}
        }
    }
    for name in &schema.categorical {
        match row.get(name) {
            None | Some(FeatureValue::Missing) => {
                row.insert(name.as_str(), schema.defaults.categorical_default());
                debug!("Inserted missing categorical column '{}'", name);
            }
            Some(FeatureValue::Number(_)) => {
                return Err(TriageError::SchemaMismatch(format!(
                    "column '{}' is declared categorical but carries a number",
                    name
                )));
            }
            Some(FeatureValue::Text(_)) => {}
        }
    }
    Ok(row)
}
