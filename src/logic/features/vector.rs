//! Feature Vector / Matrix - model-ready numeric rows
//!
//! A `FeatureVector` is one transformed record, index-aligned to the
//! schema's final feature order. A `FeatureMatrix` is a batch of them with
//! the column names attached, which is what the drift tests compare.

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("matrix has {width} columns but {names} column names were given")]
pub struct ShapeMismatchError {
    pub names: usize,
    pub width: usize,
}

// ============================================================================
// FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    pub fn from_values(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }
}

// ============================================================================
// FEATURE MATRIX
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    data: Array2<f32>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, data: Array2<f32>) -> Result<Self, ShapeMismatchError> {
        if columns.len() != data.ncols() {
            return Err(ShapeMismatchError {
                names: columns.len(),
                width: data.ncols(),
            });
        }
        Ok(Self { columns, data })
    }

    /// Stack vectors that share one column layout
    pub(crate) fn from_vectors(columns: Vec<String>, vectors: &[FeatureVector]) -> Self {
        let mut data = Array2::<f32>::zeros((vectors.len(), columns.len()));
        for (mut row, vector) in data.axis_iter_mut(Axis(0)).zip(vectors) {
            row.assign(&ArrayView1::from(vector.as_slice()));
        }
        Self { columns, data }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f32>> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.data.column(i))
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }
}
