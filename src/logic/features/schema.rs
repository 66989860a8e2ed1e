//! Feature Schema - the authoritative column layout
//!
//! Loaded once at startup from `feature_schema.json` and shared read-only.
//! Every check that depends only on the schema happens here, at load time,
//! so the transform hot path never re-validates.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("final_feature_order is empty")]
    EmptyFeatureOrder,

    #[error("feature '{0}' appears more than once in final_feature_order")]
    DuplicateFeature(String),

    #[error("feature '{0}' in final_feature_order cannot be resolved to an encoded or numeric column")]
    UnresolvableFeature(String),

    #[error("encoded column '{0}' does not belong to any categorical feature")]
    OrphanEncodedColumn(String),
}

/// On-disk layout of the schema file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    drop_features: Vec<String>,
    #[serde(default)]
    categorical_features: Vec<String>,
    #[serde(default)]
    encoded_columns: Vec<String>,
    final_feature_order: Vec<String>,
    #[serde(default)]
    numeric_features: Option<Vec<String>>,
}

/// Validated feature schema
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    drop_features: HashSet<String>,
    categorical_features: Vec<String>,
    encoded_columns: HashSet<String>,
    final_feature_order: Vec<String>,
    fingerprint: String,
}

impl FeatureSchema {
    /// Load and validate a schema file
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let data = fs::read(path)?;
        let file: SchemaFile = serde_json::from_slice(&data)?;
        Self::from_file(file)
    }

    /// Parse and validate a schema from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let file: SchemaFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    /// Build a schema from its parts. `numeric_features`, when given,
    /// becomes a strict allow-list for non-encoded final columns.
    pub fn new(
        drop_features: Vec<String>,
        categorical_features: Vec<String>,
        encoded_columns: Vec<String>,
        final_feature_order: Vec<String>,
        numeric_features: Option<Vec<String>>,
    ) -> Result<Self, SchemaError> {
        Self::from_file(SchemaFile {
            drop_features,
            categorical_features,
            encoded_columns,
            final_feature_order,
            numeric_features,
        })
    }

    fn from_file(file: SchemaFile) -> Result<Self, SchemaError> {
        if file.final_feature_order.is_empty() {
            return Err(SchemaError::EmptyFeatureOrder);
        }

        let mut seen = HashSet::new();
        for name in &file.final_feature_order {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateFeature(name.clone()));
            }
        }

        for column in &file.encoded_columns {
            if encoding_source(&file.categorical_features, column).is_none() {
                return Err(SchemaError::OrphanEncodedColumn(column.clone()));
            }
        }

        let drop_features: HashSet<String> = file.drop_features.into_iter().collect();
        let encoded_columns: HashSet<String> = file.encoded_columns.into_iter().collect();
        let numeric_features: Option<HashSet<String>> =
            file.numeric_features.map(|n| n.into_iter().collect());

        for name in &file.final_feature_order {
            if drop_features.contains(name) || encoded_columns.contains(name) {
                continue;
            }

            // A raw categorical field never survives one-hot encoding
            if file.categorical_features.contains(name) {
                return Err(SchemaError::UnresolvableFeature(name.clone()));
            }

            let resolvable = match &numeric_features {
                Some(numeric) => numeric.contains(name),
                // Shaped like `{categorical}_{value}` but not a known encoding
                None => encoding_source(&file.categorical_features, name).is_none(),
            };
            if !resolvable {
                return Err(SchemaError::UnresolvableFeature(name.clone()));
            }
        }

        let fingerprint = compute_fingerprint(&file.final_feature_order);

        Ok(Self {
            drop_features,
            categorical_features: file.categorical_features,
            encoded_columns,
            final_feature_order: file.final_feature_order,
            fingerprint,
        })
    }

    pub fn feature_order(&self) -> &[String] {
        &self.final_feature_order
    }

    pub fn feature_count(&self) -> usize {
        self.final_feature_order.len()
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.final_feature_order.iter().position(|f| f == name)
    }

    pub fn is_dropped(&self, field: &str) -> bool {
        self.drop_features.contains(field)
    }

    pub fn is_categorical(&self, field: &str) -> bool {
        self.categorical_features.iter().any(|c| c == field)
    }

    pub fn is_encoded(&self, column: &str) -> bool {
        self.encoded_columns.contains(column)
    }

    pub fn categorical_features(&self) -> &[String] {
        &self.categorical_features
    }

    /// SHA-256 of the final feature order, hex encoded
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Categorical field an encoded column name was derived from, if any
fn encoding_source<'a>(categorical: &'a [String], column: &str) -> Option<&'a str> {
    categorical
        .iter()
        .find(|field| {
            column.len() > field.len() + 1
                && column.starts_with(field.as_str())
                && column.as_bytes()[field.len()] == b'_'
        })
        .map(|f| f.as_str())
}

fn compute_fingerprint(order: &[String]) -> String {
    let mut hasher = Sha256::new();
    for name in order {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
