//! Dashboard aggregation engine for tour and fleet operations.
//!
//! Raw operational records (bookings, fleet, requisitions, ledger, ancillary
//! revenue) in mixed currencies go in; headline KPIs, a monthly series,
//! categorical breakdowns and a vehicle leaderboard come out, all in one
//! display currency. A background scheduler keeps a published snapshot fresh
//! under a debounce policy as the record store changes.

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod store;

pub use crate::config::AppConfig;
pub use crate::core::currency::{ExchangeRateSnapshot, FALLBACK_RATE_TO_BASE, RateSource};
pub use crate::core::period::{DashboardFilter, ReportingPeriod};
pub use crate::core::records::{RecordChange, RecordSet, RecordType};
pub use crate::core::series::SeriesSelector;
pub use crate::core::snapshot::{DashboardSnapshot, KpiResult};
pub use crate::engine::DashboardEngine;
pub use crate::error::{DashboardError, Result};
pub use crate::scheduler::SnapshotState;
pub use crate::store::{MemoryRecordStore, RecordStore};
