//! Commission revenue calculation using rust_decimal for precision
//!
//! All arithmetic runs on `Decimal` internally; `f64` appears only at the
//! record boundary. VND has no minor unit, so display figures round to
//! whole units.

use rust_decimal::prelude::*;
use shared::models::{CommissionRates, Identity, Report, ReportStatus};

/// Display rounding for VND (no minor unit, half-up)
const DECIMAL_PLACES: u32 = 0;

/// Convert f64 to Decimal for calculation
///
/// Inputs are validated as finite at the write boundary. If NaN/Infinity
/// somehow reaches here, logs an error and returns ZERO to avoid silent
/// corruption of revenue figures.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in revenue calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64, rounded to whole VND
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// The viewer's revenue base for one report.
///
/// Participants earn from their shared slice of the price; an admin who did
/// not take part sees the gross figure; anyone else has no figure at all.
fn revenue_base(report: &Report, viewer: &Identity) -> Option<Decimal> {
    if report.is_participant(&viewer.id) {
        Some(to_decimal(report.shared_price()))
    } else if viewer.is_admin() {
        Some(to_decimal(report.price))
    } else {
        None
    }
}

/// Commission actually earned by `viewer` on one report.
///
/// Only approved reports yield revenue. The overtime flag selects which
/// commission percentage applies. Returns `None` when the report is not
/// approved or the viewer has no revenue base; otherwise the figure is
/// rounded to whole VND for display.
pub fn actual_revenue(report: &Report, rates: &CommissionRates, viewer: &Identity) -> Option<f64> {
    if report.status != ReportStatus::Approved {
        return None;
    }
    let base = revenue_base(report, viewer)?;
    let rate = to_decimal(rates.rate_for(report.is_overtime)) / Decimal::ONE_HUNDRED;
    Some(to_f64(base * rate))
}
