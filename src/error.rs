//! Errors surfaced across the engine boundary.
//!
//! Only failures a caller can act on become errors. Missing exchange rates and
//! malformed records degrade the numbers with a warning instead, because a
//! partial dashboard beats a blank one.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    /// A record store read failed. The previously published snapshot, if any,
    /// stays live.
    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    /// A recomputation cycle exceeded its guard and was abandoned.
    #[error("recomputation timed out after {waited:?}")]
    RecomputationTimeout { waited: Duration },

    /// The recomputation task ended without producing a snapshot.
    #[error("recomputation failed: {0}")]
    RecomputationFailed(String),

    /// The engine's background task is gone; no further commands are accepted.
    #[error("dashboard engine has stopped")]
    EngineStopped,
}

impl DashboardError {
    /// Flattens a store error with its context chain into `StoreUnavailable`.
    pub(crate) fn store(err: anyhow::Error) -> Self {
        Self::StoreUnavailable(format!("{err:#}"))
    }
}
