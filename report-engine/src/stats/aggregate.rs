//! Pure aggregation over report sets
//!
//! Scope decisions (whose reports, which statuses) belong to the caller;
//! these functions fold whatever set they are handed. Money is folded as
//! `Decimal` and converted to `f64` once at the edge.

use std::collections::HashMap;

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::models::{
    DailyRevenuePoint, LeaderboardEntry, PaymentMethod, Report, ReportStatus, ServiceCount,
    StatsSummary,
};

use crate::revenue::{to_decimal, to_f64};
use crate::stats::window::StatsWindow;
use crate::utils::time::local_date;

/// Gross totals, payment split and per-client average over the given set.
pub fn summarize(reports: &[Report]) -> StatsSummary {
    let mut total = Decimal::ZERO;
    let mut cash = Decimal::ZERO;
    let mut transfer = Decimal::ZERO;
    for report in reports {
        let price = to_decimal(report.price);
        total += price;
        match report.payment_method {
            PaymentMethod::Cash => cash += price,
            PaymentMethod::Transfer => transfer += price,
        }
    }

    let clients = reports.len() as u64;
    let average = if clients > 0 {
        total / Decimal::from(clients)
    } else {
        Decimal::ZERO
    };

    StatsSummary {
        total_revenue: to_f64(total),
        total_clients: clients,
        cash_revenue: to_f64(cash),
        transfer_revenue: to_f64(transfer),
        average_revenue: to_f64(average),
    }
}

/// Period-over-period movement as a percentage, one decimal, half-up.
///
/// A zero previous period reads as +100% when anything happened this
/// period and 0% when nothing did.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    let current = to_decimal(current);
    let previous = to_decimal(previous);
    if previous.is_zero() {
        return if current > Decimal::ZERO { 100.0 } else { 0.0 };
    }
    ((current - previous) / previous * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Approved revenue per calendar day across the window, in millions of VND.
///
/// Every day in the window gets a point; quiet days read 0.
pub fn daily_revenue_series(
    reports: &[Report],
    window: &StatsWindow,
    tz: Tz,
) -> Vec<DailyRevenuePoint> {
    let mut by_day: HashMap<NaiveDate, Decimal> = HashMap::new();
    for report in reports {
        if report.status != ReportStatus::Approved {
            continue;
        }
        let day = local_date(report.created_at, tz);
        *by_day.entry(day).or_insert(Decimal::ZERO) += to_decimal(report.price);
    }

    let million = Decimal::new(1_000_000, 0);
    window
        .days(tz)
        .into_iter()
        .map(|date| {
            let total = by_day.get(&date).copied().unwrap_or(Decimal::ZERO);
            DailyRevenuePoint {
                date,
                millions: (total / million).to_f64().unwrap_or(0.0),
            }
        })
        .collect()
}

/// How many reports carry each service label, most common first.
///
/// A report with several labels counts once toward each of them.
pub fn service_distribution(reports: &[Report]) -> Vec<ServiceCount> {
    let mut counts: Vec<ServiceCount> = Vec::new();
    for report in reports {
        for label in &report.services {
            match counts.iter_mut().find(|entry| entry.label == *label) {
                Some(entry) => entry.count += 1,
                None => counts.push(ServiceCount {
                    label: label.clone(),
                    count: 1,
                }),
            }
        }
    }
    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Per-participant revenue credit and report count, highest revenue first.
///
/// Both participants of a shared report are credited its shared price and
/// one report each; a two-person report therefore counts twice across the
/// board, once per person. Ties keep first-seen order.
pub fn leaderboard(reports: &[Report]) -> Vec<LeaderboardEntry> {
    struct Credit {
        name: String,
        revenue: Decimal,
        report_count: u64,
    }

    let mut order: Vec<String> = Vec::new();
    let mut credits: HashMap<String, Credit> = HashMap::new();

    let mut credit = |id: &str, name: &str, share: Decimal| {
        let entry = credits.entry(id.to_owned()).or_insert_with(|| {
            order.push(id.to_owned());
            Credit {
                name: if name.is_empty() {
                    id.to_owned()
                } else {
                    name.to_owned()
                },
                revenue: Decimal::ZERO,
                report_count: 0,
            }
        });
        entry.revenue += share;
        entry.report_count += 1;
    };

    for report in reports {
        let share = to_decimal(report.shared_price());
        credit(&report.user_id, &report.employee_name, share);
        if let Some(partner_id) = &report.partner_id
            && !partner_id.is_empty()
            && partner_id != &report.user_id
        {
            let partner_name = report.partner_name.as_deref().unwrap_or("");
            credit(partner_id, partner_name, share);
        }
    }

    let mut ranked: Vec<(Decimal, LeaderboardEntry)> = order
        .into_iter()
        .filter_map(|id| {
            credits.remove(&id).map(|credit| {
                let entry = LeaderboardEntry {
                    user_id: id,
                    name: credit.name,
                    revenue: to_f64(credit.revenue),
                    report_count: credit.report_count,
                };
                (credit.revenue, entry)
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().map(|(_, entry)| entry).collect()
}
