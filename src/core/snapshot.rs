//! The published dashboard snapshot and the pure function assembling it.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::aggregate;
use crate::core::currency::{ExchangeRateSnapshot, from_base};
use crate::core::period::{DashboardFilter, ReportingPeriod};
use crate::core::records::RecordSet;
use crate::core::series::{
    CategoryTotal, SeriesPoint, SeriesSelector, VehicleStanding, expense_breakdown,
    income_breakdown, revenue_series, vehicle_leaderboard,
};

/// A headline figure in the display currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiResult {
    pub value: Decimal,
    pub currency: String,
}

impl KpiResult {
    fn display(base_value: Decimal, display_currency: &str, rates: &ExchangeRateSnapshot) -> Self {
        Self {
            value: from_base(base_value, display_currency, rates),
            currency: display_currency.to_string(),
        }
    }
}

/// Everything one dashboard render needs, computed for a single filter.
///
/// The snapshot is a value: once built it is never mutated, and building it
/// twice from the same records yields an equal value. It deliberately carries
/// no wall-clock field; `rates_refreshed_at` comes from the rate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub filter: DashboardFilter,

    pub total_revenue: KpiResult,
    pub booking_revenue: KpiResult,
    pub ledger_income: KpiResult,
    pub activity_margin: KpiResult,
    pub total_expenses: KpiResult,
    pub net_position: KpiResult,
    pub outstanding_balance: KpiResult,

    pub booking_count: usize,
    pub active_bookings: usize,
    pub pending_requisitions: usize,
    pub fleet_size: usize,
    pub fleet_in_use: usize,
    pub fleet_under_maintenance: usize,
    pub fleet_utilization_pct: u32,

    pub monthly_revenue: Vec<SeriesPoint>,
    pub expense_breakdown: Vec<CategoryTotal>,
    pub income_breakdown: Vec<CategoryTotal>,
    pub vehicle_leaderboard: Vec<VehicleStanding>,

    pub rates_refreshed_at: DateTime<Utc>,
}

/// Year the snapshot's monthly chart covers: the filter's year when a month is
/// selected, otherwise the most recent year with revenue-bearing activity so an
/// all-time dashboard charts something rather than an arbitrary calendar year.
fn chart_year(records: &RecordSet, rates: &ExchangeRateSnapshot, period: &ReportingPeriod) -> i32 {
    if let ReportingPeriod::SpecificMonth { year, .. } = period {
        return *year;
    }
    records
        .bookings
        .iter()
        .filter_map(|b| b.travel_date)
        .chain(records.ledger.iter().map(|e| e.occurred_at))
        .chain(records.revenue_entries.iter().map(|e| e.occurred_at))
        .max()
        .map(|t| t.year())
        .unwrap_or_else(|| rates.refreshed_at.year())
}

/// Computes a whole dashboard from one set of records. Pure: no clock, no IO,
/// no shared state, so it can run on the blocking pool and be retried freely.
pub fn build_snapshot(
    records: &RecordSet,
    rates: &ExchangeRateSnapshot,
    filter: &DashboardFilter,
    leaderboard_size: usize,
) -> DashboardSnapshot {
    let period = &filter.period;
    let display = filter.display_currency.as_str();

    let booking_revenue = aggregate::booking_revenue(&records.bookings, period, rates);
    let ledger_income = aggregate::ledger_income(&records.ledger, period, rates);
    let activity_margin = aggregate::activity_margin(&records.revenue_entries, period, rates);
    let total_revenue = booking_revenue + ledger_income + activity_margin;
    let total_expenses = aggregate::total_expenses(records, period, rates);

    DashboardSnapshot {
        filter: filter.clone(),

        total_revenue: KpiResult::display(total_revenue, display, rates),
        booking_revenue: KpiResult::display(booking_revenue, display, rates),
        ledger_income: KpiResult::display(ledger_income, display, rates),
        activity_margin: KpiResult::display(activity_margin, display, rates),
        total_expenses: KpiResult::display(total_expenses, display, rates),
        net_position: KpiResult::display(total_revenue - total_expenses, display, rates),
        outstanding_balance: KpiResult::display(
            aggregate::outstanding_balance(&records.bookings, period, rates),
            display,
            rates,
        ),

        booking_count: aggregate::booking_count(&records.bookings, period),
        active_bookings: aggregate::active_bookings(&records.bookings, period),
        pending_requisitions: aggregate::pending_requisitions(&records.requisitions, period),
        fleet_size: aggregate::fleet_size(&records.fleet),
        fleet_in_use: aggregate::fleet_in_use(&records.fleet),
        fleet_under_maintenance: aggregate::fleet_under_maintenance(&records.fleet),
        fleet_utilization_pct: aggregate::fleet_utilization_pct(&records.fleet),

        monthly_revenue: revenue_series(
            records,
            rates,
            display,
            &SeriesSelector::Year(chart_year(records, rates, period)),
        ),
        expense_breakdown: expense_breakdown(
            &records.requisitions,
            &records.ledger,
            period,
            rates,
            display,
        ),
        income_breakdown: income_breakdown(&records.ledger, period, rates, display),
        vehicle_leaderboard: vehicle_leaderboard(
            &records.bookings,
            &records.fleet,
            period,
            rates,
            display,
            leaderboard_size,
            None,
        ),

        rates_refreshed_at: rates.refreshed_at,
    }
}
