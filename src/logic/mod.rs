//! Monitoring engine core
//!
//! - `features`: schema-driven preprocessing
//! - `model`: fraud scorer handle
//! - `inference`: per-request scoring with confidence rules
//! - `monitoring`: behavior statistics, silent shift, orchestration
//! - `drift`: input distribution drift (KS)

pub mod drift;
pub mod features;
pub mod inference;
pub mod model;
pub mod monitoring;
