//! Dashboard assembly
//!
//! `StatsService` is the read side of the engine: it resolves the window,
//! queries the store within the viewer's visibility scope and folds the
//! result into one [`DashboardStats`] value per render.

use std::sync::Arc;

use chrono_tz::Tz;
use shared::error::AppResult;
use shared::models::{DashboardStats, Identity, Report, ReportStatus, StatsDelta, StatsPeriod};

use crate::access::visible_query;
use crate::stats::aggregate;
use crate::stats::window::StatsWindow;
use crate::store::ReportStore;

pub struct StatsService {
    store: Arc<dyn ReportStore>,
    tz: Tz,
}

impl StatsService {
    pub fn new(store: Arc<dyn ReportStore>, tz: Tz) -> Self {
        Self { store, tz }
    }

    /// Everything one dashboard render needs for `period`, as `viewer`
    /// sees it.
    ///
    /// Admins aggregate the whole shop with revenue totals drawn from
    /// approved reports; employees aggregate every report they take part
    /// in, whatever its status. A failing store query surfaces as a
    /// retryable error, never as a quietly empty dashboard. Dropping the
    /// returned future abandons the in-flight queries.
    pub async fn dashboard(
        &self,
        period: StatsPeriod,
        viewer: &Identity,
    ) -> AppResult<DashboardStats> {
        let window = StatsWindow::resolve(period, self.tz);
        let (current, previous) = futures::future::try_join(
            self.fetch(viewer, &window),
            self.fetch(viewer, &window.previous()),
        )
        .await?;

        let current_scoped = revenue_scope(&current, viewer);
        let previous_scoped = revenue_scope(&previous, viewer);

        let summary = aggregate::summarize(&current_scoped);
        let previous_summary = aggregate::summarize(&previous_scoped);
        let delta = StatsDelta {
            revenue_change_pct: aggregate::percent_change(
                summary.total_revenue,
                previous_summary.total_revenue,
            ),
            clients_change_pct: aggregate::percent_change(
                summary.total_clients as f64,
                previous_summary.total_clients as f64,
            ),
        };

        let leaderboard = if viewer.is_admin() {
            aggregate::leaderboard(&current_scoped)
        } else {
            Vec::new()
        };

        tracing::debug!(
            viewer = %viewer.id,
            reports = current.len(),
            total_revenue = summary.total_revenue,
            "Dashboard aggregated"
        );

        Ok(DashboardStats {
            summary,
            delta,
            daily_revenue: aggregate::daily_revenue_series(&current, &window, self.tz),
            service_distribution: aggregate::service_distribution(&current),
            leaderboard,
        })
    }

    async fn fetch(&self, viewer: &Identity, window: &StatsWindow) -> AppResult<Vec<Report>> {
        let query = visible_query(viewer).between(window.start_millis, window.end_millis);
        Ok(self.store.query(&query).await?)
    }
}

/// The subset revenue totals are computed over.
///
/// The shop's books only count approved work, so admins total that subset.
/// An employee's own view tracks everything they submitted or partnered
/// on, reviewed or not.
fn revenue_scope(reports: &[Report], viewer: &Identity) -> Vec<Report> {
    if viewer.is_admin() {
        reports
            .iter()
            .filter(|report| report.status == ReportStatus::Approved)
            .cloned()
            .collect()
    } else {
        reports.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, ReportQuery, StoreError, StoreEvent, StoreResult};
    use crate::utils::time::day_start_millis;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use shared::error::AppError;
    use shared::models::{CommissionRates, PaymentMethod};
    use tokio::sync::broadcast;

    const TZ: Tz = chrono_tz::UTC;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn report(
        id: &str,
        price: f64,
        user_id: &str,
        status: ReportStatus,
        created_at: i64,
    ) -> Report {
        let mut report = Report {
            id: id.to_owned(),
            price,
            services: vec!["Nail".to_owned()],
            payment_method: PaymentMethod::Cash,
            note: None,
            image_url: None,
            status,
            is_overtime: false,
            user_id: user_id.to_owned(),
            employee_name: user_id.to_uppercase(),
            partner_id: None,
            partner_name: None,
            participant_ids: Vec::new(),
            created_at,
            updated_at: created_at,
        };
        report.rebuild_participants();
        report
    }

    async fn seeded_service(reports: Vec<Report>) -> StatsService {
        let store = Arc::new(MemoryStore::new());
        for report in reports {
            store.insert(report).await.unwrap();
        }
        StatsService::new(store, TZ)
    }

    // ========== Scoping ==========

    #[tokio::test]
    async fn admin_revenue_counts_only_approved_reports() {
        let day = date(2026, 3, 15);
        let start = day_start_millis(day, TZ);
        let service = seeded_service(vec![
            report("r-1", 100_000.0, "u-1", ReportStatus::Approved, start + 1_000),
            report("r-2", 50_000.0, "u-2", ReportStatus::Pending, start + 2_000),
            report("r-3", 999_000.0, "u-1", ReportStatus::Approved, start - 1),
        ])
        .await;

        let stats = service
            .dashboard(StatsPeriod::Custom(day), &Identity::admin("boss", "Chi"))
            .await
            .unwrap();

        assert_eq!(stats.summary.total_revenue, 100_000.0);
        assert_eq!(stats.summary.total_clients, 1);
        // Distribution spans the whole visible window set
        assert_eq!(stats.service_distribution[0].count, 2);
        assert_eq!(stats.daily_revenue.len(), 1);
        assert_eq!(stats.daily_revenue[0].millions, 0.1);
        assert_eq!(stats.leaderboard.len(), 1);
        assert_eq!(stats.leaderboard[0].user_id, "u-1");
    }

    #[tokio::test]
    async fn employee_totals_own_reports_regardless_of_status() {
        let day = date(2026, 3, 15);
        let start = day_start_millis(day, TZ);
        let service = seeded_service(vec![
            report("r-1", 100_000.0, "u-1", ReportStatus::Approved, start + 1_000),
            report("r-2", 50_000.0, "u-1", ReportStatus::Pending, start + 2_000),
            report("r-3", 999_000.0, "u-2", ReportStatus::Approved, start + 3_000),
        ])
        .await;

        let stats = service
            .dashboard(StatsPeriod::Custom(day), &Identity::employee("u-1", "Lan"))
            .await
            .unwrap();

        assert_eq!(stats.summary.total_revenue, 150_000.0);
        assert_eq!(stats.summary.total_clients, 2);
        assert!(stats.leaderboard.is_empty());
    }

    // ========== Deltas ==========

    #[tokio::test]
    async fn delta_compares_against_the_preceding_window() {
        let day = date(2026, 3, 15);
        let start = day_start_millis(day, TZ);
        let day_before = day_start_millis(date(2026, 3, 14), TZ);
        let service = seeded_service(vec![
            report("r-1", 150_000.0, "u-1", ReportStatus::Approved, start + 1_000),
            report("r-2", 100_000.0, "u-1", ReportStatus::Approved, day_before + 1_000),
        ])
        .await;

        let stats = service
            .dashboard(StatsPeriod::Custom(day), &Identity::admin("boss", "Chi"))
            .await
            .unwrap();

        assert_eq!(stats.delta.revenue_change_pct, 50.0);
        assert_eq!(stats.delta.clients_change_pct, 0.0);
    }

    // ========== Failure semantics ==========

    /// Store whose report queries always fail
    struct BrokenQueryStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl ReportStore for BrokenQueryStore {
        async fn insert(&self, report: Report) -> StoreResult<String> {
            self.inner.insert(report).await
        }

        async fn get(&self, id: &str) -> StoreResult<Option<Report>> {
            self.inner.get(id).await
        }

        async fn update(&self, report: &Report) -> StoreResult<()> {
            self.inner.update(report).await
        }

        async fn delete(&self, id: &str) -> StoreResult<()> {
            self.inner.delete(id).await
        }

        async fn apply_batch(&self, reports: &[Report]) -> StoreResult<()> {
            self.inner.apply_batch(reports).await
        }

        async fn delete_many(&self, ids: &[String]) -> StoreResult<usize> {
            self.inner.delete_many(ids).await
        }

        async fn query(&self, _query: &ReportQuery) -> StoreResult<Vec<Report>> {
            Err(StoreError::Backend("missing index".to_owned()))
        }

        fn events(&self) -> broadcast::Receiver<StoreEvent> {
            self.inner.events()
        }

        async fn load_rates(&self) -> StoreResult<Option<CommissionRates>> {
            self.inner.load_rates().await
        }

        async fn save_rates(&self, rates: &CommissionRates) -> StoreResult<()> {
            self.inner.save_rates(rates).await
        }

        async fn clear_rates(&self) -> StoreResult<()> {
            self.inner.clear_rates().await
        }
    }

    #[tokio::test]
    async fn failing_store_surfaces_a_retryable_error() {
        let service = StatsService::new(
            Arc::new(BrokenQueryStore {
                inner: MemoryStore::new(),
            }),
            TZ,
        );

        let err = service
            .dashboard(StatsPeriod::Today, &Identity::admin("boss", "Chi"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Collaborator { .. }));
        assert!(err.is_retryable());
    }
}
