//! Shared types for the salon report engine
//!
//! Data models (reports, commission rates, identities, statistics) and the
//! unified error taxonomy used across the workspace.

pub mod error;
pub mod models;

// Re-exports
pub use error::{AppError, AppResult};
pub use serde::{Deserialize, Serialize};
