//! Monthly series, categorical breakdowns and the vehicle leaderboard.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::core::aggregate::{self, in_period_or_skip};
use crate::core::currency::{ExchangeRateSnapshot, from_base, to_base};
use crate::core::eligibility;
use crate::core::period::{ReportingPeriod, matches_period};
use crate::core::records::{BookingRecord, FleetRecord, LedgerRecord, RecordSet, RequisitionRecord};

/// Which months of a year a chart draws. This is the chart's own selector; it is
/// deliberately independent of the dashboard-wide period filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesSelector {
    Year(i32),
    Quarter { year: i32, quarter: u32 },
    Months { year: i32, months: Vec<u32> },
}

impl SeriesSelector {
    pub fn year(&self) -> i32 {
        match self {
            SeriesSelector::Year(year)
            | SeriesSelector::Quarter { year, .. }
            | SeriesSelector::Months { year, .. } => *year,
        }
    }

    /// Whether a month (1..=12) is drawn. An out-of-range quarter or month list
    /// selects nothing.
    fn selects(&self, month: u32) -> bool {
        match self {
            SeriesSelector::Year(_) => true,
            SeriesSelector::Quarter { quarter, .. } => {
                (1..=4).contains(quarter) && (quarter * 3 - 2..=quarter * 3).contains(&month)
            }
            SeriesSelector::Months { months, .. } => months.contains(&month),
        }
    }
}

/// One bucket of a 12-month series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub month: u32,
    pub value: Decimal,
}

/// Builds a 12-bucket series for the selector's year. Selected months get their
/// value from `bucket`, which is handed that month as a reporting period;
/// unselected months stay zero so the chart shape is stable.
pub fn monthly_series(
    selector: &SeriesSelector,
    mut bucket: impl FnMut(ReportingPeriod) -> Decimal,
) -> Vec<SeriesPoint> {
    let year = selector.year();
    (1..=12)
        .map(|month| {
            let value = if selector.selects(month) {
                bucket(ReportingPeriod::month(year, month))
            } else {
                Decimal::ZERO
            };
            SeriesPoint { month, value }
        })
        .collect()
}

/// Total revenue per month in the display currency, one conversion per bucket.
pub fn revenue_series(
    records: &RecordSet,
    rates: &ExchangeRateSnapshot,
    display_currency: &str,
    selector: &SeriesSelector,
) -> Vec<SeriesPoint> {
    monthly_series(selector, |period| {
        from_base(
            aggregate::total_revenue(records, &period, rates),
            display_currency,
            rates,
        )
    })
}

/// One contribution to a categorical breakdown: an amount, its currency, its
/// category spelling as recorded, and the timestamp the period filter applies
/// to. Eligibility filtering happens before contributions are built.
pub struct Contribution<'a> {
    pub category: &'a str,
    pub amount: Decimal,
    pub currency: &'a str,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub label: String,
    pub total: Decimal,
}

/// Groups contributions by category, case- and whitespace-insensitively, and
/// returns display-currency totals sorted descending. The first spelling seen
/// for a category becomes its label. Non-positive totals are dropped rather
/// than drawn as empty or inverted chart slices.
pub fn category_breakdown<'a>(
    contributions: impl IntoIterator<Item = Contribution<'a>>,
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
    display_currency: &str,
) -> Vec<CategoryTotal> {
    // key, first-seen label, base-currency total, in first-seen order
    let mut groups: Vec<(String, String, Decimal)> = Vec::new();
    for contribution in contributions {
        if !matches_period(contribution.at, period) {
            continue;
        }
        let key = contribution.category.trim().to_lowercase();
        let amount = to_base(contribution.amount, contribution.currency, rates);
        match groups.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, _, total)) => *total += amount,
            None => groups.push((key, contribution.category.trim().to_string(), amount)),
        }
    }
    let mut totals: Vec<CategoryTotal> = groups
        .into_iter()
        .filter(|(_, _, total)| *total > Decimal::ZERO)
        .map(|(_, label, total)| CategoryTotal {
            label,
            total: from_base(total, display_currency, rates),
        })
        .collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    totals
}

/// Spend by category: valid requisitions merged with posted ledger expenses.
/// Requisitions key on the request date, ledger entries on when the money
/// moved.
pub fn expense_breakdown(
    requisitions: &[RequisitionRecord],
    ledger: &[LedgerRecord],
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
    display_currency: &str,
) -> Vec<CategoryTotal> {
    let requisition_items = requisitions
        .iter()
        .filter(|r| eligibility::valid_expense(r))
        .filter_map(|r| {
            let Some(amount) = r.amount else {
                warn!("Skipping requisition {} with no amount", r.id);
                return None;
            };
            Some(Contribution {
                category: &r.category,
                amount,
                currency: &r.currency,
                at: r.created_at,
            })
        });
    let ledger_items = ledger
        .iter()
        .filter(|e| eligibility::posted_expense(e))
        .map(|e| Contribution {
            category: &e.category,
            amount: e.amount,
            currency: &e.currency,
            at: e.occurred_at,
        });
    category_breakdown(requisition_items.chain(ledger_items), period, rates, display_currency)
}

/// Posted ledger income by category.
pub fn income_breakdown(
    ledger: &[LedgerRecord],
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
    display_currency: &str,
) -> Vec<CategoryTotal> {
    let items = ledger
        .iter()
        .filter(|e| eligibility::posted_income(e))
        .map(|e| Contribution {
            category: &e.category,
            amount: e.amount,
            currency: &e.currency,
            at: e.occurred_at,
        });
    category_breakdown(items, period, rates, display_currency)
}

/// One row of the vehicle leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleStanding {
    pub vehicle_id: String,
    /// Registration from the fleet register, or the raw id when the vehicle is
    /// not on it.
    pub label: String,
    pub revenue: Decimal,
    pub trips: usize,
}

/// Ranks vehicles by the revenue of their revenue-eligible bookings, keyed on
/// travel date. Bookings with no assigned vehicle are skipped. `class_filter`
/// keeps only vehicles of a fleet class (ASCII case-insensitive); a vehicle
/// missing from the register never matches a class filter.
pub fn vehicle_leaderboard(
    bookings: &[BookingRecord],
    fleet: &[FleetRecord],
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
    display_currency: &str,
    top_n: usize,
    class_filter: Option<&str>,
) -> Vec<VehicleStanding> {
    let register: HashMap<&str, &FleetRecord> =
        fleet.iter().map(|v| (v.id.as_str(), v)).collect();

    // id, base-currency revenue, trips, in first-seen order
    let mut standings: Vec<(String, Decimal, usize)> = Vec::new();
    for booking in bookings.iter().filter(|b| eligibility::revenue_eligible(b)) {
        let Some(vehicle_id) = booking.vehicle_id.as_deref() else {
            continue;
        };
        if !in_period_or_skip(booking.travel_date, period, &booking.id, "travel date") {
            continue;
        }
        if let Some(class) = class_filter {
            let matches_class = register
                .get(vehicle_id)
                .is_some_and(|v| v.class.eq_ignore_ascii_case(class));
            if !matches_class {
                continue;
            }
        }
        let Some(paid) = booking.paid_amount else {
            warn!("Skipping booking {} with no recorded payment", booking.id);
            continue;
        };
        let amount = to_base(paid, &booking.currency, rates);
        match standings.iter_mut().find(|(id, _, _)| id.as_str() == vehicle_id) {
            Some((_, revenue, trips)) => {
                *revenue += amount;
                *trips += 1;
            }
            None => standings.push((vehicle_id.to_string(), amount, 1)),
        }
    }

    let mut rows: Vec<VehicleStanding> = standings
        .into_iter()
        .map(|(id, revenue, trips)| VehicleStanding {
            label: register
                .get(id.as_str())
                .map(|v| v.name.clone())
                .unwrap_or_else(|| id.clone()),
            vehicle_id: id,
            revenue: from_base(revenue, display_currency, rates),
            trips,
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    rows.truncate(top_n);
    rows
}
