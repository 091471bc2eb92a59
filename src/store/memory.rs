//! In-memory reference implementation of the record store.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::RecordStore;
use crate::core::currency::ExchangeRateSnapshot;
use crate::core::records::{
    BookingRecord, FleetRecord, LedgerRecord, RecordChange, RecordSet, RecordType,
    RequisitionRecord, RevenueEntry,
};

struct Collections {
    bookings: Vec<BookingRecord>,
    fleet: Vec<FleetRecord>,
    ledger: Vec<LedgerRecord>,
    requisitions: Vec<RequisitionRecord>,
    revenue_entries: Vec<RevenueEntry>,
    rates: ExchangeRateSnapshot,
}

struct Subscription {
    types: Vec<RecordType>,
    tx: UnboundedSender<RecordChange>,
}

/// Thread-safe record store backed by plain vectors. Serves as the reference
/// implementation of the store contract and as the fixture store in tests.
pub struct MemoryRecordStore {
    collections: RwLock<Collections>,
    subscribers: Mutex<Vec<Subscription>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(Collections {
                bookings: Vec::new(),
                fleet: Vec::new(),
                ledger: Vec::new(),
                requisitions: Vec::new(),
                revenue_entries: Vec::new(),
                rates: ExchangeRateSnapshot::new("USD"),
            }),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Replaces every record collection at once, notifying each type. Rates
    /// are left untouched; use [`MemoryRecordStore::replace_rates`].
    pub async fn seed(&self, records: RecordSet) {
        {
            let mut collections = self.collections.write().await;
            collections.bookings = records.bookings;
            collections.fleet = records.fleet;
            collections.ledger = records.ledger;
            collections.requisitions = records.requisitions;
            collections.revenue_entries = records.revenue_entries;
        }
        for record_type in [
            RecordType::Bookings,
            RecordType::Fleet,
            RecordType::Ledger,
            RecordType::Requisitions,
            RecordType::RevenueEntries,
        ] {
            self.notify(record_type).await;
        }
    }

    pub async fn upsert_booking(&self, booking: BookingRecord) {
        {
            let mut collections = self.collections.write().await;
            match collections.bookings.iter_mut().find(|b| b.id == booking.id) {
                Some(existing) => *existing = booking,
                None => collections.bookings.push(booking),
            }
        }
        self.notify(RecordType::Bookings).await;
    }

    pub async fn remove_booking(&self, id: &str) {
        let removed = {
            let mut collections = self.collections.write().await;
            let before = collections.bookings.len();
            collections.bookings.retain(|b| b.id != id);
            collections.bookings.len() != before
        };
        if removed {
            self.notify(RecordType::Bookings).await;
        }
    }

    pub async fn upsert_vehicle(&self, vehicle: FleetRecord) {
        {
            let mut collections = self.collections.write().await;
            match collections.fleet.iter_mut().find(|v| v.id == vehicle.id) {
                Some(existing) => *existing = vehicle,
                None => collections.fleet.push(vehicle),
            }
        }
        self.notify(RecordType::Fleet).await;
    }

    pub async fn upsert_ledger_entry(&self, entry: LedgerRecord) {
        {
            let mut collections = self.collections.write().await;
            match collections.ledger.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry,
                None => collections.ledger.push(entry),
            }
        }
        self.notify(RecordType::Ledger).await;
    }

    pub async fn upsert_requisition(&self, requisition: RequisitionRecord) {
        {
            let mut collections = self.collections.write().await;
            match collections
                .requisitions
                .iter_mut()
                .find(|r| r.id == requisition.id)
            {
                Some(existing) => *existing = requisition,
                None => collections.requisitions.push(requisition),
            }
        }
        self.notify(RecordType::Requisitions).await;
    }

    pub async fn upsert_revenue_entry(&self, entry: RevenueEntry) {
        {
            let mut collections = self.collections.write().await;
            match collections
                .revenue_entries
                .iter_mut()
                .find(|e| e.id == entry.id)
            {
                Some(existing) => *existing = entry,
                None => collections.revenue_entries.push(entry),
            }
        }
        self.notify(RecordType::RevenueEntries).await;
    }

    /// Swaps in a whole new rate table. Readers see either the old table or
    /// the new one, never a mix.
    pub async fn replace_rates(&self, rates: ExchangeRateSnapshot) {
        {
            let mut collections = self.collections.write().await;
            collections.rates = rates;
        }
        self.notify(RecordType::ExchangeRates).await;
    }

    async fn notify(&self, record_type: RecordType) {
        let mut subscribers = self.subscribers.lock().await;
        debug!(
            "Notifying {} subscribers of {:?} change",
            subscribers.len(),
            record_type
        );
        subscribers.retain(|s| {
            if !s.types.contains(&record_type) {
                return !s.tx.is_closed();
            }
            s.tx.send(RecordChange { record_type }).is_ok()
        });
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn bookings(&self) -> Result<Vec<BookingRecord>> {
        Ok(self.collections.read().await.bookings.clone())
    }

    async fn fleet(&self) -> Result<Vec<FleetRecord>> {
        Ok(self.collections.read().await.fleet.clone())
    }

    async fn ledger(&self) -> Result<Vec<LedgerRecord>> {
        Ok(self.collections.read().await.ledger.clone())
    }

    async fn requisitions(&self) -> Result<Vec<RequisitionRecord>> {
        Ok(self.collections.read().await.requisitions.clone())
    }

    async fn revenue_entries(&self) -> Result<Vec<RevenueEntry>> {
        Ok(self.collections.read().await.revenue_entries.clone())
    }

    async fn exchange_rates(&self) -> Result<ExchangeRateSnapshot> {
        Ok(self.collections.read().await.rates.clone())
    }

    async fn subscribe_changes(&self, types: &[RecordType]) -> UnboundedReceiver<RecordChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().await.push(Subscription {
            types: types.to_vec(),
            tx,
        });
        rx
    }
}
