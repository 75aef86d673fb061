//! Report Engine - salon service-report lifecycle and aggregation
//!
//! # Overview
//!
//! The engine owns the rules of the report workflow:
//!
//! - **Lifecycle** (`reports`): create, edit, approve/reject, delete, with
//!   permission and state checks, plus live feeds of query results
//! - **Revenue** (`revenue`): participant revenue splitting and commission
//!   rates, exact decimal arithmetic
//! - **Statistics** (`stats`): time-windowed dashboards with deltas, daily
//!   series, service distribution and the leaderboard
//! - **Administration** (`admin`): role changes, account removal, backup
//!   and wipe
//! - **Storage** (`store`): the narrow contract the engine expects from a
//!   document store, with an in-memory implementation
//!
//! # Module structure
//!
//! ```text
//! report-engine/src/
//! ├── core/      # configuration, engine state
//! ├── access/    # identity, roles, visibility scope
//! ├── store/     # store contract + in-memory store
//! ├── reports/   # lifecycle manager, validation, feeds
//! ├── rates/     # commission rate provider
//! ├── revenue.rs # revenue calculator
//! ├── stats/     # windows, aggregation, dashboard
//! ├── admin/     # privileged operations
//! └── utils/     # logging, time conversion
//! ```

pub mod access;
pub mod admin;
pub mod core;
pub mod rates;
pub mod reports;
pub mod revenue;
pub mod stats;
pub mod store;
pub mod utils;

// Re-export the surface embedders touch
pub use access::{IdentityProvider, ReportScope, SessionIdentity};
pub use admin::{AdminService, BackupDocument, WipeOutcome};
pub use core::{Config, EngineState};
pub use rates::{RateProvider, RateState};
pub use reports::{PendingCounter, ReportFeed, ReportManager};
pub use stats::{StatsService, StatsWindow};
pub use store::{MemoryStore, ReportQuery, ReportStore, StoreEvent, UserDirectory};
pub use utils::logger::{init_logger, init_logger_with_file};
pub use utils::{AppError, AppResult};
