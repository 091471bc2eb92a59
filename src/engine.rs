//! The dashboard engine: the crate's public face.
//!
//! An engine handle is cheap to clone. It computes snapshots on demand,
//! retargets and pokes the background publisher, and hands out subscriptions
//! to its output. The background scheduler stops once every handle is gone.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use crate::config::AppConfig;
use crate::core::period::DashboardFilter;
use crate::core::records::RecordType;
use crate::core::series::{SeriesPoint, SeriesSelector, revenue_series};
use crate::core::snapshot::{DashboardSnapshot, build_snapshot};
use crate::error::{DashboardError, Result};
use crate::scheduler::{Command, Scheduler, SnapshotState};
use crate::store::{RecordStore, load_store_snapshot};

#[derive(Clone)]
pub struct DashboardEngine {
    store: Arc<dyn RecordStore>,
    config: AppConfig,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SnapshotState>,
}

impl DashboardEngine {
    /// Spawns the background scheduler and returns a handle to it. The
    /// scheduler immediately computes a first snapshot, so a populated store
    /// publishes without waiting for a change.
    pub async fn new(store: Arc<dyn RecordStore>, config: AppConfig) -> Self {
        let changes = store.subscribe_changes(&RecordType::ALL).await;
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SnapshotState::default());

        let scheduler = Scheduler::new(
            Arc::clone(&store),
            config.clone(),
            changes,
            command_rx,
            state_tx,
        );
        tokio::spawn(scheduler.run());
        debug!("Dashboard engine started");

        Self {
            store,
            config,
            commands: command_tx,
            state: state_rx,
        }
    }

    /// Computes a dashboard for the given filter right now, independent of the
    /// background publisher. Store failures propagate to the caller.
    pub async fn get_snapshot(&self, filter: &DashboardFilter) -> Result<DashboardSnapshot> {
        let store_snapshot = load_store_snapshot(self.store.as_ref())
            .await
            .map_err(DashboardError::store)?;
        let filter = filter.clone();
        let leaderboard_size = self.config.leaderboard_size;
        tokio::task::spawn_blocking(move || {
            build_snapshot(
                &store_snapshot.records,
                &store_snapshot.rates,
                &filter,
                leaderboard_size,
            )
        })
        .await
        .map_err(|err| DashboardError::RecomputationFailed(err.to_string()))
    }

    /// Triggers a recomputation immediately, bypassing the debounce window,
    /// and waits for the outcome of the cycle the request joined.
    pub async fn refresh_now(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::RefreshNow { reply: reply_tx })
            .map_err(|_| DashboardError::EngineStopped)?;
        match reply_rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(DashboardError::EngineStopped),
        }
    }

    /// Retargets the background publisher. Takes effect after the debounce
    /// window, like any other change.
    pub fn set_filter(&self, filter: DashboardFilter) -> Result<()> {
        self.commands
            .send(Command::SetFilter { filter })
            .map_err(|_| DashboardError::EngineStopped)
    }

    /// Subscribes to published snapshots. The receiver always holds the latest
    /// state; slow consumers simply skip intermediate revisions.
    pub fn on_snapshot_updated(&self) -> watch::Receiver<SnapshotState> {
        self.state.clone()
    }

    /// The latest published state without subscribing.
    pub fn current(&self) -> SnapshotState {
        self.state.borrow().clone()
    }

    /// Revenue chart for an arbitrary selection of months, decoupled from the
    /// dashboard-wide filter.
    pub async fn monthly_revenue_series(
        &self,
        selector: &SeriesSelector,
        display_currency: &str,
    ) -> Result<Vec<SeriesPoint>> {
        let store_snapshot = load_store_snapshot(self.store.as_ref())
            .await
            .map_err(DashboardError::store)?;
        Ok(revenue_series(
            &store_snapshot.records,
            &store_snapshot.rates,
            display_currency,
            selector,
        ))
    }
}
