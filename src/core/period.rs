//! Reporting periods and half-open month-interval matching.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Time window a dashboard computation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingPeriod {
    AllTime,
    SpecificMonth { year: i32, month: u32 },
}

impl ReportingPeriod {
    pub fn month(year: i32, month: u32) -> Self {
        Self::SpecificMonth { year, month }
    }
}

/// What the dashboard is computed for: a time window and the currency every
/// published value is displayed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardFilter {
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub period: ReportingPeriod,
    pub display_currency: String,
}

impl DashboardFilter {
    pub fn new(period: ReportingPeriod, display_currency: &str) -> Self {
        Self {
            period,
            display_currency: display_currency.to_string(),
        }
    }
}

impl Default for DashboardFilter {
    fn default() -> Self {
        Self::new(ReportingPeriod::AllTime, "USD")
    }
}

/// First instant of the month and first instant of the following month, so the
/// interval is half-open. `None` for a month outside 1..=12.
pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).single()?;
    Some((start, end))
}

/// Whether a timestamp falls inside the period. An unrepresentable month
/// matches nothing.
pub fn matches_period(ts: DateTime<Utc>, period: &ReportingPeriod) -> bool {
    match period {
        ReportingPeriod::AllTime => true,
        ReportingPeriod::SpecificMonth { year, month } => match month_bounds(*year, *month) {
            Some((start, end)) => start <= ts && ts < end,
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec).unwrap()
    }

    #[test]
    fn test_all_time_matches_everything() {
        assert!(matches_period(ts(1970, 1, 1, 0, 0, 0), &ReportingPeriod::AllTime));
        assert!(matches_period(ts(2099, 12, 31, 23, 59, 59), &ReportingPeriod::AllTime));
    }

    #[test]
    fn test_month_interval_is_half_open() {
        let june = ReportingPeriod::month(2026, 6);
        assert!(matches_period(ts(2026, 6, 1, 0, 0, 0), &june));
        assert!(matches_period(ts(2026, 6, 30, 23, 59, 59), &june));
        assert!(!matches_period(ts(2026, 7, 1, 0, 0, 0), &june));
        assert!(!matches_period(ts(2026, 5, 31, 23, 59, 59), &june));
    }

    #[test]
    fn test_december_rolls_into_january() {
        let (start, end) = month_bounds(2025, 12).unwrap();
        assert_eq!(start, ts(2025, 12, 1, 0, 0, 0));
        assert_eq!(end, ts(2026, 1, 1, 0, 0, 0));
        let dec = ReportingPeriod::month(2025, 12);
        assert!(matches_period(ts(2025, 12, 31, 23, 59, 59), &dec));
        assert!(!matches_period(ts(2026, 1, 1, 0, 0, 0), &dec));
    }

    #[test]
    fn test_leap_year_february() {
        let feb = ReportingPeriod::month(2024, 2);
        assert!(matches_period(ts(2024, 2, 29, 23, 59, 59), &feb));
        assert!(!matches_period(ts(2024, 3, 1, 0, 0, 0), &feb));
    }

    #[test]
    fn test_invalid_month_matches_nothing() {
        assert_eq!(month_bounds(2026, 0), None);
        assert_eq!(month_bounds(2026, 13), None);
        let bogus = ReportingPeriod::month(2026, 13);
        assert!(!matches_period(ts(2026, 6, 15, 12, 0, 0), &bogus));
    }
}
