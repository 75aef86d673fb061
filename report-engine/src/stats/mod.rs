//! Time-windowed statistics
//!
//! - **window**: period-to-timestamp-range resolution in the shop timezone
//! - **aggregate**: pure folds over report sets
//! - **service**: store queries, visibility scoping and dashboard assembly
//!
//! Everything is recomputed from scratch per window; there is no
//! incremental state to invalidate.

pub mod aggregate;
pub mod service;
pub mod window;

pub use service::StatsService;
pub use window::StatsWindow;
