//! Engine wiring - configuration and shared state
//!
//! - [`Config`] - environment-driven settings
//! - [`EngineState`] - one handle over every service

pub mod config;
pub mod state;

pub use config::Config;
pub use state::EngineState;
