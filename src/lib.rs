//! fraudwatch - label-free monitoring for a fraud-scoring model
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         FRAUDWATCH                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  /predict ──► FeatureTransformer ──► Model ──► Rule check    │
//! │                                        │           │         │
//! │                                        ▼           ▼         │
//! │                               PredictionStore  AlertStore    │
//! │                                        ▲           ▲         │
//! │  MonitoringOrchestrator ───────────────┴───────────┘         │
//! │    (behavior stats, silent shift, KS drift)                  │
//! │                            │                                 │
//! │                     ┌─────────────┐                          │
//! │                     │ PostgreSQL  │                          │
//! │                     └─────────────┘                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logic;
pub mod models;
pub mod server;
pub mod store;

pub use error::{AppError, AppResult};
pub use server::{create_router, AppState};
