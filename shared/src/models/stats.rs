//! Dashboard statistics value types
//!
//! These are the shapes the engine hands back for rendering. All revenue
//! figures are plain VND except the chart series, which is scaled to
//! millions. Aggregation itself lives in the engine crate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reporting period selector.
///
/// Relative periods resolve against "now" in the shop timezone; `Custom`
/// pins a single business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Today,
    /// Monday through Sunday of the current week
    Week,
    Month,
    Year,
    /// One explicit business day
    Custom(NaiveDate),
}

/// Totals over whatever report set the caller selected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    /// Gross revenue over the set, VND
    pub total_revenue: f64,
    /// Number of reports; each report is one client visit
    pub total_clients: u64,
    /// Gross revenue paid in cash
    pub cash_revenue: f64,
    /// Gross revenue paid by bank transfer
    pub transfer_revenue: f64,
    /// Gross revenue per client; 0 when the set is empty
    pub average_revenue: f64,
}

/// Period-over-period movement, percent rounded to one decimal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsDelta {
    pub revenue_change_pct: f64,
    pub clients_change_pct: f64,
}

/// One day on the revenue chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenuePoint {
    pub date: NaiveDate,
    /// Approved revenue that day, in millions of VND
    pub millions: f64,
}

/// How often one service label was carried in the set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCount {
    pub label: String,
    pub count: u64,
}

/// One employee's standing on the admin leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: String,
    /// Sum of this employee's shared-price credit, VND
    pub revenue: f64,
    /// Reports the employee participated in
    pub report_count: u64,
}

/// Everything the dashboard renders for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub summary: StatsSummary,
    pub delta: StatsDelta,
    pub daily_revenue: Vec<DailyRevenuePoint>,
    pub service_distribution: Vec<ServiceCount>,
    /// Present on the admin view only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leaderboard: Vec<LeaderboardEntry>,
}
