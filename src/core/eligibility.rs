//! Per-KPI eligibility predicates.
//!
//! Each dashboard figure applies its own business rule to the same record
//! collections, so the rules live here as small pure functions instead of one
//! global "is valid" filter. None of them assume temporal filtering has
//! already run.

use rust_decimal::Decimal;

use crate::core::records::{
    BookingRecord, BookingStatus, EntryStatus, FleetRecord, FleetStatus, LedgerKind, LedgerRecord,
    LedgerStatus, RequisitionRecord, RequisitionStatus, RevenueEntry,
};

/// A booking counts toward realized revenue once it is completed, or once it is
/// confirmed with money actually received.
pub fn revenue_eligible(booking: &BookingRecord) -> bool {
    match booking.status {
        BookingStatus::Completed => true,
        BookingStatus::Confirmed => booking.paid_amount.is_some_and(|paid| paid > Decimal::ZERO),
        _ => false,
    }
}

/// Pending bookings that still owe money. A booking with no recorded payment
/// data is malformed for this figure, not outstanding.
pub fn has_outstanding_balance(booking: &BookingRecord) -> bool {
    booking.status == BookingStatus::Pending
        && booking
            .paid_amount
            .is_some_and(|paid| booking.total_amount > paid)
}

/// Everything except cancellations, for count figures.
pub fn countable_booking(booking: &BookingRecord) -> bool {
    booking.status != BookingStatus::Cancelled
}

pub fn active_now(booking: &BookingRecord) -> bool {
    matches!(
        booking.status,
        BookingStatus::Confirmed | BookingStatus::InProgress
    )
}

pub fn active_or_confirmed(booking: &BookingRecord) -> bool {
    matches!(
        booking.status,
        BookingStatus::Confirmed | BookingStatus::InProgress | BookingStatus::Completed
    )
}

/// Requisitions that represent real spend: approved or further along, and not
/// soft-deleted.
pub fn valid_expense(requisition: &RequisitionRecord) -> bool {
    !requisition.deleted
        && matches!(
            requisition.status,
            RequisitionStatus::Approved | RequisitionStatus::Completed | RequisitionStatus::Resolved
        )
}

pub fn awaiting_approval(requisition: &RequisitionRecord) -> bool {
    !requisition.deleted && requisition.status == RequisitionStatus::Pending
}

pub fn posted_income(entry: &LedgerRecord) -> bool {
    entry.status == LedgerStatus::Posted && entry.kind == LedgerKind::Income
}

pub fn posted_expense(entry: &LedgerRecord) -> bool {
    entry.status == LedgerStatus::Posted && entry.kind == LedgerKind::Expense
}

pub fn confirmed_activity(entry: &RevenueEntry) -> bool {
    entry.status == EntryStatus::Confirmed
}

/// Vehicles still on the books, whatever their day-to-day state.
pub fn in_service(vehicle: &FleetRecord) -> bool {
    vehicle.status != FleetStatus::Retired
}

pub fn in_use(vehicle: &FleetRecord) -> bool {
    vehicle.status == FleetStatus::InUse
}
