//! The record store boundary.
//!
//! The system of record lives outside this crate. The engine reads owned
//! copies of each collection through `RecordStore` and hears about mutations
//! through a payload-free change feed; it never writes back.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::core::currency::ExchangeRateSnapshot;
use crate::core::records::{
    BookingRecord, FleetRecord, LedgerRecord, RecordChange, RecordSet, RecordType,
    RequisitionRecord, RevenueEntry,
};

pub use memory::MemoryRecordStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn bookings(&self) -> Result<Vec<BookingRecord>>;
    async fn fleet(&self) -> Result<Vec<FleetRecord>>;
    async fn ledger(&self) -> Result<Vec<LedgerRecord>>;
    async fn requisitions(&self) -> Result<Vec<RequisitionRecord>>;
    async fn revenue_entries(&self) -> Result<Vec<RevenueEntry>>;
    async fn exchange_rates(&self) -> Result<ExchangeRateSnapshot>;

    /// Registers for change notifications on the given record types. Delivery
    /// is at-least-once and carries no payload; consumers re-read what they
    /// need. Dropping the receiver unsubscribes.
    async fn subscribe_changes(&self, types: &[RecordType]) -> UnboundedReceiver<RecordChange>;
}

/// Owned store state for one recomputation cycle.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub records: RecordSet,
    pub rates: ExchangeRateSnapshot,
}

/// Reads every collection and the rate table concurrently into one immutable
/// snapshot. Fails if any single read fails.
pub async fn load_store_snapshot(store: &dyn RecordStore) -> Result<StoreSnapshot> {
    let (bookings, fleet, ledger, requisitions, revenue_entries, rates) = tokio::try_join!(
        store.bookings(),
        store.fleet(),
        store.ledger(),
        store.requisitions(),
        store.revenue_entries(),
        store.exchange_rates(),
    )?;
    Ok(StoreSnapshot {
        records: RecordSet {
            bookings,
            fleet,
            ledger,
            requisitions,
            revenue_entries,
        },
        rates,
    })
}
