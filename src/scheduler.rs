//! Debounced background recomputation.
//!
//! A single task owns the Idle / PendingRecompute / Recomputing state machine.
//! Change notifications arm a debounce timer; its expiry loads an immutable
//! store snapshot, computes the dashboard on the blocking pool under a timeout
//! guard, and publishes the result on a watch channel. At most one cycle runs
//! at a time; triggers arriving mid-cycle coalesce into one follow-up cycle.

use futures::future::OptionFuture;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::core::period::DashboardFilter;
use crate::core::records::RecordChange;
use crate::core::snapshot::{DashboardSnapshot, build_snapshot};
use crate::error::{DashboardError, Result};
use crate::store::{RecordStore, load_store_snapshot};

/// Latest publication on the snapshot channel.
///
/// `revision` bumps once per successful publish, so subscribers can tell a
/// fresh snapshot from an error that left the previous one live.
#[derive(Debug, Clone, Default)]
pub struct SnapshotState {
    pub snapshot: Option<Arc<DashboardSnapshot>>,
    pub last_error: Option<DashboardError>,
    pub revision: u64,
}

pub(crate) enum Command {
    RefreshNow { reply: oneshot::Sender<Result<()>> },
    SetFilter { filter: DashboardFilter },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    PendingRecompute,
    Recomputing,
}

enum Event {
    Change,
    ChangesClosed,
    Command(Command),
    DebounceExpired,
    CycleFinished(std::result::Result<Result<DashboardSnapshot>, JoinError>),
    Shutdown,
}

type CycleHandle = JoinHandle<Result<DashboardSnapshot>>;

pub(crate) struct Scheduler {
    store: Arc<dyn RecordStore>,
    config: AppConfig,
    filter: DashboardFilter,
    changes: UnboundedReceiver<RecordChange>,
    changes_open: bool,
    commands: UnboundedReceiver<Command>,
    publisher: watch::Sender<SnapshotState>,
    phase: Phase,
    /// Debounce expiry while in PendingRecompute.
    deadline: Option<Instant>,
    /// A change arrived mid-cycle; run again after the current cycle.
    rearm: bool,
    in_flight: Option<CycleHandle>,
    /// Refresh callers awaiting the outcome of the cycle they joined.
    waiters: Vec<oneshot::Sender<Result<()>>>,
}

impl Scheduler {
    pub(crate) fn new(
        store: Arc<dyn RecordStore>,
        config: AppConfig,
        changes: UnboundedReceiver<RecordChange>,
        commands: UnboundedReceiver<Command>,
        publisher: watch::Sender<SnapshotState>,
    ) -> Self {
        let filter = config.default_filter.clone();
        Self {
            store,
            config,
            filter,
            changes,
            changes_open: true,
            commands,
            publisher,
            phase: Phase::Idle,
            deadline: None,
            rearm: false,
            in_flight: None,
            waiters: Vec::new(),
        }
    }

    pub(crate) async fn run(mut self) {
        debug!("Dashboard scheduler started");
        // A populated store publishes at startup, before any change arrives.
        self.begin_cycle();

        loop {
            let debounce: OptionFuture<_> = self.deadline.map(time::sleep_until).into();
            let cycle: OptionFuture<_> = self.in_flight.as_mut().into();

            let event = tokio::select! {
                maybe_change = self.changes.recv(), if self.changes_open => match maybe_change {
                    Some(_) => Event::Change,
                    None => Event::ChangesClosed,
                },
                maybe_command = self.commands.recv() => match maybe_command {
                    Some(command) => Event::Command(command),
                    None => Event::Shutdown,
                },
                Some(_) = debounce => Event::DebounceExpired,
                Some(join_result) = cycle => Event::CycleFinished(join_result),
            };

            match event {
                Event::Change => self.note_change(),
                Event::ChangesClosed => {
                    debug!("Change feed closed");
                    self.changes_open = false;
                }
                Event::Command(Command::RefreshNow { reply }) => self.refresh_now(reply),
                Event::Command(Command::SetFilter { filter }) => self.set_filter(filter),
                Event::DebounceExpired => self.begin_cycle(),
                Event::CycleFinished(join_result) => self.finish_cycle(join_result),
                Event::Shutdown => break,
            }
        }
        debug!("Dashboard scheduler stopped");
    }

    fn note_change(&mut self) {
        match self.phase {
            Phase::Idle | Phase::PendingRecompute => {
                // Every change restarts the quiet window; a burst costs one
                // recomputation after it settles.
                self.phase = Phase::PendingRecompute;
                self.deadline = Some(Instant::now() + self.config.scheduler.debounce());
                debug!("Change noted, debounce armed");
            }
            Phase::Recomputing => {
                self.rearm = true;
                debug!("Change noted mid-cycle, will recompute again");
            }
        }
    }

    fn refresh_now(&mut self, reply: oneshot::Sender<Result<()>>) {
        self.waiters.push(reply);
        match self.phase {
            Phase::Idle | Phase::PendingRecompute => self.begin_cycle(),
            // The caller joins the in-flight cycle.
            Phase::Recomputing => {}
        }
    }

    fn set_filter(&mut self, filter: DashboardFilter) {
        debug!("Dashboard filter updated to {:?}", filter);
        self.filter = filter;
        self.note_change();
    }

    fn begin_cycle(&mut self) {
        self.phase = Phase::Recomputing;
        self.deadline = None;
        self.rearm = false;

        let store = Arc::clone(&self.store);
        let filter = self.filter.clone();
        let leaderboard_size = self.config.leaderboard_size;
        let timeout = self.config.scheduler.recompute_timeout();
        self.in_flight = Some(tokio::spawn(async move {
            run_cycle(store, filter, leaderboard_size, timeout).await
        }));
        debug!("Recomputation cycle started");
    }

    fn finish_cycle(&mut self, join_result: std::result::Result<Result<DashboardSnapshot>, JoinError>) {
        self.in_flight = None;
        let outcome = match join_result {
            Ok(outcome) => outcome,
            Err(err) => Err(DashboardError::RecomputationFailed(err.to_string())),
        };
        let waiter_outcome = outcome.as_ref().map(|_| ()).map_err(Clone::clone);

        match outcome {
            Ok(snapshot) => {
                self.publisher.send_modify(|state| {
                    state.snapshot = Some(Arc::new(snapshot));
                    state.last_error = None;
                    state.revision += 1;
                });
                debug!("Published dashboard snapshot");
            }
            Err(err) => {
                // The previous snapshot stays live; only the error slot moves.
                warn!("Recomputation cycle failed: {}", err);
                self.publisher.send_modify(|state| {
                    state.last_error = Some(err);
                });
            }
        }

        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(waiter_outcome.clone());
        }

        if self.rearm {
            self.rearm = false;
            self.phase = Phase::PendingRecompute;
            self.deadline = Some(Instant::now() + self.config.scheduler.debounce());
            debug!("Re-armed after mid-cycle change");
        } else {
            self.phase = Phase::Idle;
        }
    }
}

/// One full recomputation: store snapshot, pure computation on the blocking
/// pool, all under the timeout guard.
async fn run_cycle(
    store: Arc<dyn RecordStore>,
    filter: DashboardFilter,
    leaderboard_size: usize,
    timeout: std::time::Duration,
) -> Result<DashboardSnapshot> {
    let started = Instant::now();
    let cycle = async {
        let store_snapshot = load_store_snapshot(store.as_ref())
            .await
            .map_err(DashboardError::store)?;
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
    };
    match time::timeout(timeout, cycle).await {
        Ok(outcome) => outcome,
        Err(_) => Err(DashboardError::RecomputationTimeout {
            waited: started.elapsed(),
        }),
    }
}
