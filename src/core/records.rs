//! Operational record types read from the external record store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

/// A customer booking for a tour package.
///
/// `paid_amount` and `travel_date` may be absent in upstream data. Aggregations
/// that need the missing field skip the record with a warning instead of failing
/// the whole computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: String,
    pub tour: String,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    pub currency: String,
    pub total_amount: Decimal,
    #[serde(default)]
    pub paid_amount: Option<Decimal>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub travel_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetStatus {
    Available,
    InUse,
    UnderMaintenance,
    Retired,
}

/// A vehicle in the fleet register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetRecord {
    pub id: String,
    pub name: String,
    /// Capacity/class tag, e.g. "van" or "coach". Used by leaderboard filtering.
    pub class: String,
    pub currency: String,
    pub daily_rate: Decimal,
    pub status: FleetStatus,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequisitionStatus {
    Pending,
    Approved,
    Completed,
    Resolved,
    Rejected,
    Declined,
    Cancelled,
}

/// A cash requisition raised by staff (fuel, repairs, allowances, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequisitionRecord {
    pub id: String,
    pub purpose: String,
    pub category: String,
    pub currency: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    pub status: RequisitionStatus,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Pending,
    Posted,
    Void,
}

/// A general-ledger transaction outside the booking flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: String,
    pub description: String,
    pub category: String,
    pub kind: LedgerKind,
    pub currency: String,
    pub amount: Decimal,
    pub status: LedgerStatus,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Draft,
    Confirmed,
    Cancelled,
}

/// Revenue from an ancillary activity (boat cruise, gear hire, ...), recorded
/// with its direct costs and the share of fleet/staff cost allocated to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueEntry {
    pub id: String,
    pub activity: String,
    pub currency: String,
    pub gross_revenue: Decimal,
    pub direct_costs: Decimal,
    #[serde(default)]
    pub allocated_resource_cost: Decimal,
    pub status: EntryStatus,
    pub occurred_at: DateTime<Utc>,
}

/// One immutable view of every record collection, used for a single computation.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub bookings: Vec<BookingRecord>,
    pub fleet: Vec<FleetRecord>,
    pub ledger: Vec<LedgerRecord>,
    pub requisitions: Vec<RequisitionRecord>,
    pub revenue_entries: Vec<RevenueEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Bookings,
    Fleet,
    Ledger,
    Requisitions,
    RevenueEntries,
    ExchangeRates,
}

impl RecordType {
    pub const ALL: [RecordType; 6] = [
        RecordType::Bookings,
        RecordType::Fleet,
        RecordType::Ledger,
        RecordType::Requisitions,
        RecordType::RevenueEntries,
        RecordType::ExchangeRates,
    ];
}

/// Payload-free change notification: only which collection changed. The engine
/// always recomputes from a fresh full snapshot, so no delta is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordChange {
    pub record_type: RecordType,
}
