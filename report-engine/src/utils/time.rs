//! Shop-timezone time conversions
//!
//! Every date-to-timestamp conversion happens here; the rest of the engine
//! only passes `i64` Unix millis around.

use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Current instant, Unix millis.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current calendar date in the shop timezone.
pub fn today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Date + hour/minute/second to Unix millis in the shop timezone.
///
/// DST gap fallback: when the local time does not exist the later mapping
/// is taken, and UTC is used when the timezone yields nothing at all.
fn date_hms_to_millis(date: NaiveDate, hour: u32, min: u32, sec: u32, tz: Tz) -> i64 {
    let naive = date
        .and_hms_opt(hour, min, sec)
        .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).unwrap_or_default());
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// First millisecond of the date (00:00:00.000) in the shop timezone.
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_hms_to_millis(date, 0, 0, 0, tz)
}

/// Last millisecond of the date (23:59:59.999) in the shop timezone.
///
/// Callers use inclusive `[start, end]` bounds, so this is the next day's
/// start minus one.
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next = date.succ_opt().unwrap_or(date);
    date_hms_to_millis(next, 0, 0, 0, tz) - 1
}

/// Calendar date a timestamp falls on in the shop timezone.
pub fn local_date(millis: i64, tz: Tz) -> NaiveDate {
    match Utc.timestamp_millis_opt(millis) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&tz).date_naive(),
        _ => NaiveDate::default(),
    }
}
