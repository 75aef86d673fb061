use chrono_tz::Tz;
use shared::models::CommissionRates;

use crate::admin::PURGE_BATCH_SIZE;

/// Engine configuration
///
/// # Environment variables
///
/// Every item can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | SHOP_TIMEZONE | Asia/Ho_Chi_Minh | Timezone statistics windows resolve in |
/// | DEFAULT_COMMISSION_RATE | 10.0 | Fallback normal-hours rate, percent |
/// | OVERTIME_COMMISSION_RATE | 30.0 | Fallback overtime rate, percent |
/// | PURGE_BATCH_SIZE | 100 | Documents per cascade/wipe round-trip |
/// | EVENT_CHANNEL_CAPACITY | 1024 | Store event fan-out buffer |
/// | LOG_DIR | (unset) | When set, also write rolling daily log files |
///
/// # Example
///
/// ```ignore
/// SHOP_TIMEZONE=Asia/Bangkok DEFAULT_COMMISSION_RATE=12 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Shop-local timezone; business days and windows follow it
    pub timezone: Tz,
    /// Rates used until the saved settings record loads
    pub fallback_rates: CommissionRates,
    /// Cap on documents per bulk-deletion round-trip
    pub purge_batch_size: usize,
    /// Buffer size of the store's change broadcast
    pub event_channel_capacity: usize,
    /// Directory for rolling log files; stderr only when unset
    pub log_dir: Option<String>,
}

impl Config {
    /// Load from the environment, falling back to defaults for anything
    /// unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            timezone: std::env::var("SHOP_TIMEZONE")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(chrono_tz::Asia::Ho_Chi_Minh),
            fallback_rates: CommissionRates::new(
                std::env::var("DEFAULT_COMMISSION_RATE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(shared::models::DEFAULT_REVENUE_PERCENTAGE),
                std::env::var("OVERTIME_COMMISSION_RATE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(shared::models::DEFAULT_OVERTIME_PERCENTAGE),
            ),
            purge_batch_size: std::env::var("PURGE_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(PURGE_BATCH_SIZE),
            event_channel_capacity: std::env::var("EVENT_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// Override the pieces tests usually care about.
    pub fn with_overrides(timezone: Tz, fallback_rates: CommissionRates) -> Self {
        let mut config = Self::from_env();
        config.timezone = timezone;
        config.fallback_rates = fallback_rates;
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
