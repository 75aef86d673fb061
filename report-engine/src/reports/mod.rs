//! Report lifecycle
//!
//! - **manager**: create/edit/review/delete with permission and state checks
//! - **validate**: field validation shared by create and edit paths
//! - **feed**: live result sets and the pending-review counter
//!
//! Every mutation goes through [`ReportManager`], which persists via the
//! store contract and lets the store's event stream fan changes out to
//! whatever feeds are open.

pub mod feed;
pub mod manager;
pub mod validate;

pub use feed::{PendingCounter, ReportFeed};
pub use manager::ReportManager;
