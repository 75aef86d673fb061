//! Shop-wide commission rate configuration

use serde::{Deserialize, Serialize};

/// Fallback percentage for regular-hours work.
pub const DEFAULT_REVENUE_PERCENTAGE: f64 = 10.0;
/// Fallback percentage for overtime work.
pub const DEFAULT_OVERTIME_PERCENTAGE: f64 = 30.0;

/// Commission percentages applied to an employee's revenue base.
///
/// Lives in a single settings record. When the record is missing the engine
/// falls back to [`CommissionRates::default`] rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRates {
    /// Percent of the revenue base earned during regular hours
    pub default_revenue_percentage: f64,
    /// Percent of the revenue base earned during overtime
    pub overtime_percentage: f64,
}

impl Default for CommissionRates {
    fn default() -> Self {
        Self {
            default_revenue_percentage: DEFAULT_REVENUE_PERCENTAGE,
            overtime_percentage: DEFAULT_OVERTIME_PERCENTAGE,
        }
    }
}

impl CommissionRates {
    pub fn new(default_revenue_percentage: f64, overtime_percentage: f64) -> Self {
        Self {
            default_revenue_percentage,
            overtime_percentage,
        }
    }

    /// Percentage applicable to a report, by its overtime flag.
    pub fn rate_for(&self, is_overtime: bool) -> f64 {
        if is_overtime {
            self.overtime_percentage
        } else {
            self.default_revenue_percentage
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_ten_and_thirty() {
        let rates = CommissionRates::default();
        assert_eq!(rates.default_revenue_percentage, 10.0);
        assert_eq!(rates.overtime_percentage, 30.0);
    }

    #[test]
    fn overtime_flag_selects_rate() {
        let rates = CommissionRates::new(12.0, 35.0);
        assert_eq!(rates.rate_for(false), 12.0);
        assert_eq!(rates.rate_for(true), 35.0);
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let json = serde_json::to_value(CommissionRates::default()).unwrap();
        assert_eq!(json["defaultRevenuePercentage"], 10.0);
        assert_eq!(json["overtimePercentage"], 30.0);
    }
}
