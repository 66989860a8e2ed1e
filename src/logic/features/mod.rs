//! Features Module - schema-driven preprocessing
//!
//! Turns raw transaction payloads into the fixed-width vectors the model
//! scores and the drift detector compares.

pub mod schema;
pub mod transform;
pub mod vector;

#[cfg(test)]
mod tests;

pub use schema::{FeatureSchema, SchemaError};
pub use transform::{FeatureTransformer, TransformError};
pub use vector::{FeatureMatrix, FeatureVector, ShapeMismatchError};
