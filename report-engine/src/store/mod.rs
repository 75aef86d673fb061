//! Storage boundary for report, user, and settings records
//!
//! The engine talks to its document database through the typed contracts in
//! this module; nothing above this layer builds raw queries or raw records.
//!
//! # Collections
//!
//! | Collection | Key | Record | Purpose |
//! |-----------|-----|--------|---------|
//! | `reports` | report id | [`Report`] | Service transactions |
//! | `users` | user id | [`UserRecord`] | Role directory |
//! | `settings` | fixed | [`CommissionRates`] | Shop-wide rate record |
//!
//! # Write semantics
//!
//! Updates are whole-document replacements, matching the backing store.
//! [`ReportStore::apply_batch`] and [`ReportStore::delete_many`] are atomic:
//! either every target is written or none is, and observers see one
//! [`StoreEvent`] for the whole batch.

pub mod memory;

use async_trait::async_trait;
use shared::error::AppError;
use shared::models::{CommissionRates, Report, ReportStatus, Role, UserRecord};
use thiserror::Error;
use tokio::sync::broadcast;

pub use memory::MemoryStore;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ReportNotFound(id) => AppError::not_found(format!("report {id}")),
            StoreError::UserNotFound(id) => AppError::not_found(format!("user {id}")),
            StoreError::Backend(message) => AppError::collaborator(message),
        }
    }
}

/// Sort direction for report queries, on the business date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Declarative report query
///
/// All set filters must hold (conjunction). Date bounds are inclusive
/// Unix millis against `created_at`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportQuery {
    /// Only reports crediting this participant
    pub participant: Option<String>,
    pub status: Option<ReportStatus>,
    pub created_from: Option<i64>,
    pub created_to: Option<i64>,
    pub order: SortOrder,
}

impl ReportQuery {
    /// Every report, newest first.
    pub fn all() -> Self {
        Self::default()
    }

    /// Every pending report.
    pub fn pending() -> Self {
        Self::default().with_status(ReportStatus::Pending)
    }

    /// Reports crediting one participant.
    pub fn for_participant(user_id: impl Into<String>) -> Self {
        Self {
            participant: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: ReportStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to an inclusive `[from, to]` business-date range.
    pub fn between(mut self, from: i64, to: i64) -> Self {
        self.created_from = Some(from);
        self.created_to = Some(to);
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.order = SortOrder::OldestFirst;
        self
    }

    /// Whether a report satisfies every filter of this query.
    pub fn matches(&self, report: &Report) -> bool {
        if let Some(participant) = &self.participant
            && !report.is_participant(participant)
        {
            return false;
        }
        if let Some(status) = self.status
            && report.status != status
        {
            return false;
        }
        if let Some(from) = self.created_from
            && report.created_at < from
        {
            return false;
        }
        if let Some(to) = self.created_to
            && report.created_at > to
        {
            return false;
        }
        true
    }

    /// Order a result set in place. Ties on the business date fall back to
    /// the id so results are deterministic.
    pub fn sort(&self, reports: &mut [Report]) {
        match self.order {
            SortOrder::NewestFirst => {
                reports.sort_by(|a, b| {
                    b.created_at
                        .cmp(&a.created_at)
                        .then_with(|| b.id.cmp(&a.id))
                });
            }
            SortOrder::OldestFirst => {
                reports.sort_by(|a, b| {
                    a.created_at
                        .cmp(&b.created_at)
                        .then_with(|| a.id.cmp(&b.id))
                });
            }
        }
    }
}

/// Change notification published by a store
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Created(Report),
    Updated(Report),
    Deleted(String),
    /// One atomic batch of replacements, visible as a single change
    BulkUpdated(Vec<Report>),
    /// One atomic batch of deletions
    BulkDeleted(Vec<String>),
    RatesChanged(CommissionRates),
    /// The settings record was removed; consumers fall back to defaults
    RatesCleared,
}

/// Report and settings persistence
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a new report and return the assigned id.
    async fn insert(&self, report: Report) -> StoreResult<String>;

    async fn get(&self, id: &str) -> StoreResult<Option<Report>>;

    /// Replace the stored record. Fails when the id is unknown.
    async fn update(&self, report: &Report) -> StoreResult<()>;

    /// Remove a record. Removing an unknown id is a no-op, matching the
    /// backing document store.
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Replace every given record in one atomic batch.
    async fn apply_batch(&self, reports: &[Report]) -> StoreResult<()>;

    /// Remove every given id in one atomic batch; returns how many existed.
    async fn delete_many(&self, ids: &[String]) -> StoreResult<usize>;

    async fn query(&self, query: &ReportQuery) -> StoreResult<Vec<Report>>;

    /// Subscribe to change notifications.
    fn events(&self) -> broadcast::Receiver<StoreEvent>;

    /// Load the shop-wide rate record; `None` when it was never written.
    async fn load_rates(&self) -> StoreResult<Option<CommissionRates>>;

    async fn save_rates(&self, rates: &CommissionRates) -> StoreResult<()>;

    /// Remove the rate record.
    async fn clear_rates(&self) -> StoreResult<()>;
}

/// Per-user role records
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<UserRecord>>;

    async fn find(&self, id: &str) -> StoreResult<Option<UserRecord>>;

    async fn upsert(&self, user: &UserRecord) -> StoreResult<()>;

    /// Reassign a user's role. Fails when the user is unknown.
    async fn set_role(&self, id: &str, role: Role) -> StoreResult<()>;

    async fn remove(&self, id: &str) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::PaymentMethod;

    fn report(id: &str, created_at: i64, status: ReportStatus) -> Report {
        Report {
            id: id.to_owned(),
            price: 100_000.0,
            services: vec!["Nail".to_owned()],
            payment_method: PaymentMethod::Cash,
            note: None,
            image_url: Some("https://img.example/x.jpg".to_owned()),
            status,
            is_overtime: false,
            user_id: "u-1".to_owned(),
            employee_name: "Lan".to_owned(),
            partner_id: Some("u-2".to_owned()),
            partner_name: Some("Mai".to_owned()),
            participant_ids: vec!["u-1".to_owned(), "u-2".to_owned()],
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn query_filters_conjoin() {
        let r = report("r-1", 500, ReportStatus::Pending);

        assert!(ReportQuery::all().matches(&r));
        assert!(ReportQuery::pending().matches(&r));
        assert!(ReportQuery::for_participant("u-2").matches(&r));
        assert!(!ReportQuery::for_participant("u-9").matches(&r));
        assert!(!ReportQuery::all().with_status(ReportStatus::Approved).matches(&r));
        assert!(ReportQuery::all().between(400, 600).matches(&r));
        assert!(!ReportQuery::all().between(501, 600).matches(&r));
        assert!(!ReportQuery::all().between(400, 499).matches(&r));
        assert!(
            !ReportQuery::for_participant("u-2")
                .with_status(ReportStatus::Pending)
                .between(501, 600)
                .matches(&r)
        );
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let r = report("r-1", 500, ReportStatus::Pending);
        assert!(ReportQuery::all().between(500, 500).matches(&r));
    }

    #[test]
    fn sort_orders_by_date_then_id() {
        let mut reports = vec![
            report("r-b", 200, ReportStatus::Pending),
            report("r-a", 200, ReportStatus::Pending),
            report("r-c", 300, ReportStatus::Pending),
        ];

        ReportQuery::all().sort(&mut reports);
        let ids: Vec<&str> = reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r-c", "r-b", "r-a"]);

        ReportQuery::all().oldest_first().sort(&mut reports);
        let ids: Vec<&str> = reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r-a", "r-b", "r-c"]);
    }

    #[test]
    fn store_errors_map_to_app_errors() {
        let err: AppError = StoreError::ReportNotFound("r-1".into()).into();
        assert!(matches!(err, AppError::NotFound { .. }));

        let err: AppError = StoreError::Backend("connection reset".into()).into();
        assert!(err.is_retryable());
    }
}
