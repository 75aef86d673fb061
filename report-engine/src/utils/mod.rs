//! Utility modules
//!
//! - [`logger`]: tracing setup
//! - [`time`]: shop-timezone conversions
//!
//! Error types come from `shared::error` and are re-exported here for
//! engine-internal convenience.

pub mod logger;
pub mod time;

pub use shared::error::{AppError, AppResult};
