//! Base-currency aggregation of operational records.
//!
//! Every money figure follows the same fold: apply the figure's eligibility
//! predicate, apply the temporal filter on the figure's own timestamp field,
//! convert each surviving amount to the base currency, sum. Malformed records
//! are logged with their id and skipped so one bad record never blanks a
//! dashboard.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use crate::core::currency::{ExchangeRateSnapshot, to_base};
use crate::core::eligibility;
use crate::core::period::{ReportingPeriod, matches_period, month_bounds};
use crate::core::records::{
    BookingRecord, FleetRecord, FleetStatus, LedgerRecord, RecordSet, RequisitionRecord,
    RevenueEntry,
};

/// Temporal check for records whose timestamp field is optional. `AllTime`
/// includes the record either way; under a month filter a missing timestamp is
/// malformed and excluded.
pub(crate) fn in_period_or_skip(
    ts: Option<DateTime<Utc>>,
    period: &ReportingPeriod,
    id: &str,
    field: &str,
) -> bool {
    match (ts, period) {
        (_, ReportingPeriod::AllTime) => true,
        (Some(ts), period) => matches_period(ts, period),
        (None, ReportingPeriod::SpecificMonth { .. }) => {
            warn!("Skipping record {} with no {}", id, field);
            false
        }
    }
}

/// Paid amounts of revenue-eligible bookings, keyed on the travel date (revenue
/// is attributed to when the tour runs, not when it was booked).
pub fn booking_revenue(
    bookings: &[BookingRecord],
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
) -> Decimal {
    let mut total = Decimal::ZERO;
    for booking in bookings.iter().filter(|b| eligibility::revenue_eligible(b)) {
        if !in_period_or_skip(booking.travel_date, period, &booking.id, "travel date") {
            continue;
        }
        let Some(paid) = booking.paid_amount else {
            warn!("Skipping booking {} with no recorded payment", booking.id);
            continue;
        };
        total += to_base(paid, &booking.currency, rates);
    }
    total
}

/// Unpaid remainder of pending bookings, keyed on the booking date.
pub fn outstanding_balance(
    bookings: &[BookingRecord],
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
) -> Decimal {
    let mut total = Decimal::ZERO;
    for booking in bookings
        .iter()
        .filter(|b| eligibility::has_outstanding_balance(b))
        .filter(|b| matches_period(b.created_at, period))
    {
        let due = booking.total_amount - booking.paid_amount.unwrap_or_default();
        total += to_base(due, &booking.currency, rates);
    }
    total
}

/// Spend recorded through requisitions, keyed on the request date.
pub fn requisition_expense(
    requisitions: &[RequisitionRecord],
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
) -> Decimal {
    let mut total = Decimal::ZERO;
    for requisition in requisitions
        .iter()
        .filter(|r| eligibility::valid_expense(r))
        .filter(|r| matches_period(r.created_at, period))
    {
        let Some(amount) = requisition.amount else {
            warn!("Skipping requisition {} with no amount", requisition.id);
            continue;
        };
        total += to_base(amount, &requisition.currency, rates);
    }
    total
}

fn ledger_total(
    ledger: &[LedgerRecord],
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
    eligible: fn(&LedgerRecord) -> bool,
) -> Decimal {
    ledger
        .iter()
        .filter(|e| eligible(e))
        .filter(|e| matches_period(e.occurred_at, period))
        .map(|e| to_base(e.amount, &e.currency, rates))
        .sum()
}

/// Posted income entries, keyed on when the money moved.
pub fn ledger_income(
    ledger: &[LedgerRecord],
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
) -> Decimal {
    ledger_total(ledger, period, rates, eligibility::posted_income)
}

/// Posted expense entries, keyed on when the money moved.
pub fn ledger_expense(
    ledger: &[LedgerRecord],
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
) -> Decimal {
    ledger_total(ledger, period, rates, eligibility::posted_expense)
}

/// Margin contributed by confirmed ancillary activities, keyed on when the
/// activity ran. The margin is clamped to zero per entry, so a loss-making
/// activity contributes nothing rather than dragging the total down.
pub fn activity_margin(
    entries: &[RevenueEntry],
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
) -> Decimal {
    let mut total = Decimal::ZERO;
    for entry in entries
        .iter()
        .filter(|e| eligibility::confirmed_activity(e))
        .filter(|e| matches_period(e.occurred_at, period))
    {
        let margin = entry.gross_revenue - entry.direct_costs - entry.allocated_resource_cost;
        total += to_base(margin.max(Decimal::ZERO), &entry.currency, rates);
    }
    total
}

pub fn total_revenue(
    records: &RecordSet,
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
) -> Decimal {
    booking_revenue(&records.bookings, period, rates)
        + ledger_income(&records.ledger, period, rates)
        + activity_margin(&records.revenue_entries, period, rates)
}

pub fn total_expenses(
    records: &RecordSet,
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
) -> Decimal {
    requisition_expense(&records.requisitions, period, rates)
        + ledger_expense(&records.ledger, period, rates)
}

/// Revenue minus expenses. Negative when the window ran at a loss.
pub fn net_position(
    records: &RecordSet,
    period: &ReportingPeriod,
    rates: &ExchangeRateSnapshot,
) -> Decimal {
    total_revenue(records, period, rates) - total_expenses(records, period, rates)
}

/// Non-cancelled bookings placed in the window.
pub fn booking_count(bookings: &[BookingRecord], period: &ReportingPeriod) -> usize {
    bookings
        .iter()
        .filter(|b| eligibility::countable_booking(b))
        .filter(|b| matches_period(b.created_at, period))
        .count()
}

pub fn pending_requisitions(requisitions: &[RequisitionRecord], period: &ReportingPeriod) -> usize {
    requisitions
        .iter()
        .filter(|r| eligibility::awaiting_approval(r))
        .filter(|r| matches_period(r.created_at, period))
        .count()
}

pub fn fleet_size(fleet: &[FleetRecord]) -> usize {
    fleet.iter().filter(|v| eligibility::in_service(v)).count()
}

pub fn fleet_in_use(fleet: &[FleetRecord]) -> usize {
    fleet.iter().filter(|v| eligibility::in_use(v)).count()
}

pub fn fleet_under_maintenance(fleet: &[FleetRecord]) -> usize {
    fleet
        .iter()
        .filter(|v| v.status == FleetStatus::UnderMaintenance)
        .count()
}

/// Share of the in-service fleet currently out on the road, as a whole
/// percentage rounded half away from zero. Zero when nothing is in service.
pub fn fleet_utilization_pct(fleet: &[FleetRecord]) -> u32 {
    let in_service = fleet_size(fleet) as u64;
    if in_service == 0 {
        return 0;
    }
    let in_use = fleet_in_use(fleet) as u64;
    ((in_use * 100 + in_service / 2) / in_service) as u32
}

/// Snapshot formula: bookings active at this moment, by status alone. Used when
/// the dashboard shows all time, where "active during the window" is
/// meaningless.
pub fn active_bookings_now(bookings: &[BookingRecord]) -> usize {
    bookings.iter().filter(|b| eligibility::active_now(b)).count()
}

/// Period formula: bookings that were confirmed or ran with travel falling in
/// the given month. Completed bookings count here, unlike the snapshot formula.
pub fn active_bookings_during(bookings: &[BookingRecord], year: i32, month: u32) -> usize {
    let Some((start, end)) = month_bounds(year, month) else {
        return 0;
    };
    let mut count = 0;
    for booking in bookings.iter().filter(|b| eligibility::active_or_confirmed(b)) {
        match booking.travel_date {
            Some(t) if start <= t && t < end => count += 1,
            Some(_) => {}
            None => warn!("Skipping booking {} with no travel date", booking.id),
        }
    }
    count
}

/// Picks the active-count formula for the period variant.
pub fn active_bookings(bookings: &[BookingRecord], period: &ReportingPeriod) -> usize {
    match period {
        ReportingPeriod::AllTime => active_bookings_now(bookings),
        ReportingPeriod::SpecificMonth { year, month } => {
            active_bookings_during(bookings, *year, *month)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{
        BookingStatus, EntryStatus, LedgerKind, LedgerStatus, RequisitionStatus,
    };
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn usd_rates() -> ExchangeRateSnapshot {
        ExchangeRateSnapshot::new("USD").with_rate("EUR", dec!(1.08))
    }

    fn booking(
        id: &str,
        status: BookingStatus,
        total: Decimal,
        paid: Option<Decimal>,
        travel: Option<DateTime<Utc>>,
    ) -> BookingRecord {
        BookingRecord {
            id: id.to_string(),
            tour: "Murchison Falls".to_string(),
            vehicle_id: None,
            currency: "USD".to_string(),
            total_amount: total,
            paid_amount: paid,
            status,
            created_at: ts(2026, 5, 10),
            travel_date: travel,
        }
    }

    fn vehicle(id: &str, status: FleetStatus) -> FleetRecord {
        FleetRecord {
            id: id.to_string(),
            name: format!("UAX {id}"),
            class: "van".to_string(),
            currency: "USD".to_string(),
            daily_rate: dec!(80),
            status,
            acquired_at: ts(2024, 1, 1),
        }
    }

    fn entry(id: &str, gross: Decimal, direct: Decimal, allocated: Decimal) -> RevenueEntry {
        RevenueEntry {
            id: id.to_string(),
            activity: "boat cruise".to_string(),
            currency: "USD".to_string(),
            gross_revenue: gross,
            direct_costs: direct,
            allocated_resource_cost: allocated,
            status: EntryStatus::Confirmed,
            occurred_at: ts(2026, 6, 5),
        }
    }

    fn ledger_entry(id: &str, kind: LedgerKind, status: LedgerStatus, amount: Decimal) -> LedgerRecord {
        LedgerRecord {
            id: id.to_string(),
            description: "entry".to_string(),
            category: "General".to_string(),
            kind,
            currency: "USD".to_string(),
            amount,
            status,
            occurred_at: ts(2026, 6, 10),
            created_at: ts(2026, 6, 10),
        }
    }

    // Completed and paid-confirmed bookings count; pending and cancelled never do.
    #[test]
    fn test_booking_revenue_eligibility() {
        let bookings = vec![
            booking("b1", BookingStatus::Completed, dec!(60), Some(dec!(60)), None),
            booking("b2", BookingStatus::Confirmed, dec!(80), Some(dec!(40)), None),
            booking("b3", BookingStatus::Pending, dec!(100), Some(dec!(100)), None),
            booking("b4", BookingStatus::Cancelled, dec!(100), Some(dec!(100)), None),
        ];
        let total = booking_revenue(&bookings, &ReportingPeriod::AllTime, &usd_rates());
        assert_eq!(total, dec!(100));
    }

    #[test]
    fn test_booking_revenue_keys_on_travel_date() {
        // Booked in May, travels in June: June revenue, not May.
        let bookings = vec![booking(
            "b1",
            BookingStatus::Completed,
            dec!(500),
            Some(dec!(500)),
            Some(ts(2026, 6, 20)),
        )];
        let rates = usd_rates();
        assert_eq!(
            booking_revenue(&bookings, &ReportingPeriod::month(2026, 6), &rates),
            dec!(500)
        );
        assert_eq!(
            booking_revenue(&bookings, &ReportingPeriod::month(2026, 5), &rates),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_booking_revenue_skips_malformed_records() {
        let bookings = vec![
            // No payment data at all.
            booking("b1", BookingStatus::Completed, dec!(300), None, Some(ts(2026, 6, 2))),
            // No travel date under a month filter.
            booking("b2", BookingStatus::Completed, dec!(200), Some(dec!(200)), None),
            booking("b3", BookingStatus::Completed, dec!(50), Some(dec!(50)), Some(ts(2026, 6, 9))),
        ];
        let total = booking_revenue(&bookings, &ReportingPeriod::month(2026, 6), &usd_rates());
        assert_eq!(total, dec!(50));
    }

    #[test]
    fn test_booking_revenue_converts_to_base() {
        let mut eur = booking("b1", BookingStatus::Completed, dec!(100), Some(dec!(100)), None);
        eur.currency = "EUR".to_string();
        let total = booking_revenue(&[eur], &ReportingPeriod::AllTime, &usd_rates());
        assert_eq!(total, dec!(108));
    }

    #[test]
    fn test_outstanding_balance_is_pending_remainder() {
        let bookings = vec![
            booking("b1", BookingStatus::Pending, dec!(100), Some(dec!(30)), None),
            booking("b2", BookingStatus::Pending, dec!(100), None, None),
            booking("b3", BookingStatus::Confirmed, dec!(100), Some(dec!(30)), None),
        ];
        let total = outstanding_balance(&bookings, &ReportingPeriod::AllTime, &usd_rates());
        assert_eq!(total, dec!(70));
    }

    #[test]
    fn test_requisition_expense_skips_missing_amounts() {
        let make = |id: &str, amount: Option<Decimal>, status| RequisitionRecord {
            id: id.to_string(),
            purpose: "fuel".to_string(),
            category: "Fuel".to_string(),
            currency: "USD".to_string(),
            amount,
            status,
            deleted: false,
            created_at: ts(2026, 6, 3),
            approved_at: None,
        };
        let requisitions = vec![
            make("r1", Some(dec!(40)), RequisitionStatus::Approved),
            make("r2", None, RequisitionStatus::Approved),
            make("r3", Some(dec!(25)), RequisitionStatus::Rejected),
        ];
        let total = requisition_expense(&requisitions, &ReportingPeriod::AllTime, &usd_rates());
        assert_eq!(total, dec!(40));
    }

    #[test]
    fn test_ledger_splits_by_kind_and_status() {
        let ledger = vec![
            ledger_entry("l1", LedgerKind::Income, LedgerStatus::Posted, dec!(200)),
            ledger_entry("l2", LedgerKind::Income, LedgerStatus::Pending, dec!(999)),
            ledger_entry("l3", LedgerKind::Expense, LedgerStatus::Posted, dec!(75)),
            ledger_entry("l4", LedgerKind::Expense, LedgerStatus::Void, dec!(999)),
        ];
        let rates = usd_rates();
        assert_eq!(ledger_income(&ledger, &ReportingPeriod::AllTime, &rates), dec!(200));
        assert_eq!(ledger_expense(&ledger, &ReportingPeriod::AllTime, &rates), dec!(75));
    }

    #[test]
    fn test_activity_margin_clamps_per_entry() {
        let entries = vec![
            entry("e1", dec!(100), dec!(30), dec!(20)),
            // Loss-making: clamps to zero instead of subtracting.
            entry("e2", dec!(50), dec!(80), dec!(0)),
        ];
        let total = activity_margin(&entries, &ReportingPeriod::AllTime, &usd_rates());
        assert_eq!(total, dec!(50));
    }

    #[test]
    fn test_net_position_can_go_negative() {
        let records = RecordSet {
            ledger: vec![
                ledger_entry("l1", LedgerKind::Income, LedgerStatus::Posted, dec!(100)),
                ledger_entry("l2", LedgerKind::Expense, LedgerStatus::Posted, dec!(250)),
            ],
            ..Default::default()
        };
        let rates = usd_rates();
        assert_eq!(net_position(&records, &ReportingPeriod::AllTime, &rates), dec!(-150));
        assert_eq!(total_revenue(&records, &ReportingPeriod::AllTime, &rates), dec!(100));
        assert_eq!(total_expenses(&records, &ReportingPeriod::AllTime, &rates), dec!(250));
    }

    #[test]
    fn test_fleet_utilization() {
        let mut fleet: Vec<FleetRecord> = (0..7)
            .map(|i| vehicle(&format!("v{i}"), FleetStatus::Available))
            .collect();
        fleet.push(vehicle("v7", FleetStatus::InUse));
        fleet.push(vehicle("v8", FleetStatus::InUse));
        fleet.push(vehicle("v9", FleetStatus::InUse));
        // Retired vehicles are outside both numerator and denominator.
        fleet.push(vehicle("v10", FleetStatus::Retired));

        assert_eq!(fleet_size(&fleet), 10);
        assert_eq!(fleet_in_use(&fleet), 3);
        assert_eq!(fleet_utilization_pct(&fleet), 30);
    }

    #[test]
    fn test_fleet_utilization_zero_guard() {
        assert_eq!(fleet_utilization_pct(&[]), 0);
        let retired = vec![vehicle("v1", FleetStatus::Retired)];
        assert_eq!(fleet_utilization_pct(&retired), 0);
    }

    #[test]
    fn test_utilization_rounds_half_away_from_zero() {
        let mut fleet: Vec<FleetRecord> = (0..7)
            .map(|i| vehicle(&format!("v{i}"), FleetStatus::Available))
            .collect();
        fleet.push(vehicle("v7", FleetStatus::InUse));
        // 1 of 8 in use: 12.5 rounds up to 13.
        assert_eq!(fleet_utilization_pct(&fleet), 13);
    }

    #[test]
    fn test_active_bookings_two_formulas() {
        let bookings = vec![
            booking("b1", BookingStatus::Confirmed, dec!(1), None, Some(ts(2026, 6, 10))),
            booking("b2", BookingStatus::InProgress, dec!(1), None, Some(ts(2026, 7, 1))),
            booking("b3", BookingStatus::Completed, dec!(1), None, Some(ts(2026, 6, 20))),
            booking("b4", BookingStatus::Pending, dec!(1), None, Some(ts(2026, 6, 5))),
        ];
        // Snapshot formula counts by status alone.
        assert_eq!(active_bookings_now(&bookings), 2);
        // Period formula admits completed bookings but pins travel to the month.
        assert_eq!(active_bookings_during(&bookings, 2026, 6), 2);
        assert_eq!(active_bookings_during(&bookings, 2026, 7), 1);
        assert_eq!(active_bookings_during(&bookings, 2026, 13), 0);

        assert_eq!(active_bookings(&bookings, &ReportingPeriod::AllTime), 2);
        assert_eq!(active_bookings(&bookings, &ReportingPeriod::month(2026, 6)), 2);
    }

    #[test]
    fn test_counts_filter_by_created_at() {
        let mut b1 = booking("b1", BookingStatus::Pending, dec!(1), None, None);
        b1.created_at = ts(2026, 5, 2);
        let mut b2 = booking("b2", BookingStatus::Confirmed, dec!(1), None, None);
        b2.created_at = ts(2026, 6, 2);
        let mut b3 = booking("b3", BookingStatus::Cancelled, dec!(1), None, None);
        b3.created_at = ts(2026, 6, 3);
        let bookings = vec![b1, b2, b3];

        assert_eq!(booking_count(&bookings, &ReportingPeriod::AllTime), 2);
        assert_eq!(booking_count(&bookings, &ReportingPeriod::month(2026, 6)), 1);
    }
}
