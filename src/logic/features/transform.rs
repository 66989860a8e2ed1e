//! Feature Transformer - raw record → schema-aligned vector
//!
//! Steps per record:
//! 1. drop configured fields (unknown drop fields are fine)
//! 2. one-hot encode categorical fields as `{field}_{value}`
//! 3. known encoded columns that did not occur stay 0
//! 4. numeric columns absent from the record stay 0
//! 5. emit exactly `final_feature_order` as f32
//!
//! Steps 3-5 fall out of writing into a zeroed vector through a name → index
//! map built once from the schema.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use super::schema::FeatureSchema;
use super::vector::{FeatureMatrix, FeatureVector};

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("field '{field}' is not numeric: {value}")]
    NonNumeric { field: String, value: String },

    #[error("categorical field '{field}' has an unsupported value: {value}")]
    UnsupportedCategory { field: String, value: String },

    #[error("row {index} is not a JSON object")]
    NotAnObject { index: usize },
}

pub struct FeatureTransformer {
    schema: Arc<FeatureSchema>,
    index: HashMap<String, usize>,
}

impl FeatureTransformer {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        let index = schema
            .feature_order()
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Self { schema, index }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Transform a single raw record
    pub fn transform(&self, raw: &Map<String, Value>) -> Result<FeatureVector, TransformError> {
        let mut values = vec![0.0f32; self.schema.feature_count()];

        for (field, value) in raw {
            if self.schema.is_dropped(field) {
                continue;
            }

            if self.schema.is_categorical(field) {
                if let Some(category) = category_label(field, value)? {
                    let column = format!("{}_{}", field, category);
                    if let Some(&i) = self.index.get(&column) {
                        values[i] = 1.0;
                    }
                }
                continue;
            }

            // Fields outside the final order are discarded without parsing
            if let Some(&i) = self.index.get(field) {
                values[i] = numeric_value(field, value)?;
            }
        }

        Ok(FeatureVector::from_values(values))
    }

    /// Transform a batch; every row shares the schema column order
    pub fn transform_many<'a, I>(&self, rows: I) -> Result<FeatureMatrix, TransformError>
    where
        I: IntoIterator<Item = &'a Map<String, Value>>,
    {
        let vectors = rows
            .into_iter()
            .map(|row| self.transform(row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeatureMatrix::from_vectors(
            self.schema.feature_order().to_vec(),
            &vectors,
        ))
    }

    /// Transform stored JSON payloads, each of which must be an object
    pub fn transform_values(&self, rows: &[Value]) -> Result<FeatureMatrix, TransformError> {
        let objects = rows
            .iter()
            .enumerate()
            .map(|(index, row)| row.as_object().ok_or(TransformError::NotAnObject { index }))
            .collect::<Result<Vec<_>, _>>()?;

        self.transform_many(objects)
    }
}

/// Column suffix for a categorical value; `null` encodes to nothing
fn category_label(field: &str, value: &Value) -> Result<Option<String>, TransformError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(true) => Ok(Some("True".to_string())),
        Value::Bool(false) => Ok(Some("False".to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(TransformError::UnsupportedCategory {
            field: field.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Numeric cast; `null` is an absent feature and maps to 0
fn numeric_value(field: &str, value: &Value) -> Result<f32, TransformError> {
    let non_numeric = || TransformError::NonNumeric {
        field: field.to_string(),
        value: value.to_string(),
    };

    match value {
        Value::Null => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64().map(|v| v as f32).ok_or_else(non_numeric),
        Value::String(s) => s.trim().parse::<f64>().map(|v| v as f32).map_err(|_| non_numeric()),
        _ => Err(non_numeric()),
    }
}
