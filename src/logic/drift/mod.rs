//! Drift Module - input distribution drift
//!
//! # Architecture
//! - `ks.rs`: two-sample Kolmogorov-Smirnov test
//! - `detector.rs`: per-feature tests folded into a `DriftReport`
//! - `reference.rs`: reference data sources and the reference stats artifact

pub mod detector;
pub mod ks;
pub mod reference;

pub use detector::{
    DistributionDriftDetector, DriftError, DriftReport, DriftStatus, DriftSummary, FeatureDrift, FeatureTest,
    DEFAULT_P_VALUE_THRESHOLD,
};
pub use ks::{ks_2samp, KsResult};
pub use reference::{
    compute_reference_stats, load_reference_stats, save_reference_stats, FeatureSummary, JsonReferenceFile,
    ReferenceDataSource, ReferenceError, ReferenceStats, StaticReference,
};
