//! Data models
//!
//! Shared between the report engine and its embedders. All timestamps are
//! Unix milliseconds; all wire keys are camelCase to match the document
//! records.

pub mod identity;
pub mod rates;
pub mod report;
pub mod stats;

// Re-exports
pub use identity::*;
pub use rates::*;
pub use report::*;
pub use stats::*;
