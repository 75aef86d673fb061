//! Statistics windows
//!
//! A window is the inclusive millisecond range one dashboard view covers.
//! Relative periods resolve against "now" in the shop timezone; the week
//! starts on Monday, month and year follow the calendar.

use chrono::{Datelike, Days, NaiveDate};
use chrono_tz::Tz;
use shared::models::StatsPeriod;

use crate::utils::time::{day_end_millis, day_start_millis, local_date, today};

/// Inclusive `[start, end]` millisecond range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    pub start_millis: i64,
    pub end_millis: i64,
}

impl StatsWindow {
    /// Resolve a period against the current shop-local date.
    pub fn resolve(period: StatsPeriod, tz: Tz) -> Self {
        Self::resolve_at(period, today(tz), tz)
    }

    /// Resolve a period against an explicit anchor date.
    pub fn resolve_at(period: StatsPeriod, anchor: NaiveDate, tz: Tz) -> Self {
        let (first, last) = match period {
            StatsPeriod::Today => (anchor, anchor),
            StatsPeriod::Custom(date) => (date, date),
            StatsPeriod::Week => {
                let monday = anchor
                    .checked_sub_days(Days::new(u64::from(
                        anchor.weekday().num_days_from_monday(),
                    )))
                    .unwrap_or(anchor);
                let sunday = monday.checked_add_days(Days::new(6)).unwrap_or(monday);
                (monday, sunday)
            }
            StatsPeriod::Month => month_bounds(anchor),
            StatsPeriod::Year => year_bounds(anchor),
        };
        Self {
            start_millis: day_start_millis(first, tz),
            end_millis: day_end_millis(last, tz),
        }
    }

    /// The immediately preceding window of identical duration, abutting
    /// this one without overlap.
    pub fn previous(&self) -> Self {
        let span = self.end_millis - self.start_millis;
        Self {
            start_millis: self.start_millis - span - 1,
            end_millis: self.start_millis - 1,
        }
    }

    pub fn contains(&self, millis: i64) -> bool {
        millis >= self.start_millis && millis <= self.end_millis
    }

    /// Calendar days the window covers, in order.
    pub fn days(&self, tz: Tz) -> Vec<NaiveDate> {
        let first = local_date(self.start_millis, tz);
        let last = local_date(self.end_millis, tz);
        first.iter_days().take_while(|day| *day <= last).collect()
    }
}

fn month_bounds(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = anchor.with_day(1).unwrap_or(anchor);
    let next_month = if anchor.month() == 12 {
        NaiveDate::from_ymd_opt(anchor.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(anchor.year(), anchor.month() + 1, 1)
    };
    let last = next_month.and_then(|day| day.pred_opt()).unwrap_or(anchor);
    (first, last)
}

fn year_bounds(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(anchor.year(), 1, 1).unwrap_or(anchor),
        NaiveDate::from_ymd_opt(anchor.year(), 12, 31).unwrap_or(anchor),
    )
}
