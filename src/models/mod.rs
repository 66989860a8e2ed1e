//! Data models

pub mod prediction;
pub mod behavior;
pub mod alert;

pub use prediction::*;
pub use behavior::*;
pub use alert::*;
