//! Pure dashboard computations: records in, figures out.

pub mod aggregate;
pub mod currency;
pub mod eligibility;
pub mod log;
pub mod period;
pub mod records;
pub mod series;
pub mod snapshot;

// Re-export main types for cleaner imports
pub use currency::{ExchangeRateSnapshot, FALLBACK_RATE_TO_BASE, RateSource};
pub use period::{DashboardFilter, ReportingPeriod};
pub use records::{RecordChange, RecordSet, RecordType};
pub use series::SeriesSelector;
pub use snapshot::{DashboardSnapshot, KpiResult, build_snapshot};
