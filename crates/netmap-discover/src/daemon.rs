//! Topology discovery daemon.
//!
//! The controller owns the `Stopped`/`Running` lifecycle. While running, a
//! single tokio task repeats scan → store → wait until it is cancelled:
//!
//! ```text
//! loop:
//!     snapshot = prober.scan(range)      // failures become error snapshots
//!     store.set(snapshot)
//!     wait(interval) or cancellation     // interval read at each wait
//! ```
//!
//! Start, stop and interval changes are linearized through one async mutex.
//! `stop` cancels the task and joins it before reporting the daemon stopped,
//! so a later `start` can never overlap a task from an earlier run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use netmap_core::Snapshot;

use crate::error::DaemonError;
use crate::prober::Prober;
use crate::store::TopologyStore;

/// Point-in-time view of the daemon for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaemonStatus {
    pub running: bool,
    pub interval_secs: i64,
    pub network_range: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    /// Live polling tasks. Never more than one.
    pub active_tasks: usize,
}

/// Bookkeeping for the current `Running` period.
struct RunningDaemon {
    range: String,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Starts, stops and reconfigures the background polling task.
pub struct DaemonController {
    prober: Arc<dyn Prober>,
    store: Arc<TopologyStore>,
    interval: watch::Sender<i64>,
    state: Mutex<Option<RunningDaemon>>,
    active_tasks: Arc<AtomicUsize>,
}

impl DaemonController {
    /// Create a stopped controller with the given initial interval in seconds.
    pub fn new(prober: Arc<dyn Prober>, store: Arc<TopologyStore>, interval_secs: i64) -> Self {
        let (interval, _) = watch::channel(interval_secs);
        Self {
            prober,
            store,
            interval,
            state: Mutex::new(None),
            active_tasks: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start polling `range`. Returns the interval in effect.
    ///
    /// Fails with [`DaemonError::AlreadyRunning`] without side effects if a
    /// task is already running.
    pub async fn start(&self, range: &str) -> Result<i64, DaemonError> {
        let mut state = self.state.lock().await;
        reap_finished(&mut state).await;
        if state.is_some() {
            tracing::debug!(target = %range, "Start requested while daemon is running");
            return Err(DaemonError::AlreadyRunning);
        }

        let interval_secs = *self.interval.borrow();
        let cancel = CancellationToken::new();
        let guard = TaskGuard::new(self.active_tasks.clone());

        let handle = tokio::spawn(poll_loop(
            self.prober.clone(),
            self.store.clone(),
            range.to_string(),
            self.interval.subscribe(),
            cancel.clone(),
            guard,
        ));

        *state = Some(RunningDaemon {
            range: range.to_string(),
            started_at: Utc::now(),
            cancel,
            handle,
        });

        tracing::info!(target = %range, interval_secs, "Daemon started");
        Ok(interval_secs)
    }

    /// Stop the polling task and wait for it to exit.
    ///
    /// If a scan is in flight this waits for it to return. The daemon is
    /// reported `Running` until the task has been joined.
    pub async fn stop(&self) -> Result<(), DaemonError> {
        let mut state = self.state.lock().await;
        reap_finished(&mut state).await;
        let Some(running) = state.as_mut() else {
            tracing::debug!("Stop requested while daemon is not running");
            return Err(DaemonError::NotRunning);
        };

        tracing::info!(target = %running.range, "Stopping daemon");
        running.cancel.cancel();
        if let Err(e) = (&mut running.handle).await {
            tracing::error!(error = %e, "Polling task ended abnormally");
        }
        *state = None;

        tracing::info!("Daemon stopped");
        Ok(())
    }

    /// Change the polling interval.
    ///
    /// Takes effect at the task's next wait; a wait already in progress keeps
    /// its original length. Any value is accepted; zero or negative values
    /// make the task rescan without pausing.
    pub async fn set_interval(&self, secs: i64) -> i64 {
        let _state = self.state.lock().await;
        self.interval.send_replace(secs);
        tracing::info!(interval_secs = secs, "Daemon interval changed");
        secs
    }

    /// Current interval in seconds.
    pub fn interval(&self) -> i64 {
        *self.interval.borrow()
    }

    pub async fn is_running(&self) -> bool {
        let mut state = self.state.lock().await;
        reap_finished(&mut state).await;
        state.is_some()
    }

    /// Number of polling tasks currently alive.
    pub fn active_tasks(&self) -> usize {
        self.active_tasks.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> DaemonStatus {
        let mut state = self.state.lock().await;
        reap_finished(&mut state).await;
        DaemonStatus {
            running: state.is_some(),
            interval_secs: self.interval(),
            network_range: state.as_ref().map(|r| r.range.clone()),
            started_at: state.as_ref().map(|r| r.started_at),
            active_tasks: self.active_tasks(),
        }
    }

    pub fn store(&self) -> &Arc<TopologyStore> {
        &self.store
    }
}

impl Drop for DaemonController {
    fn drop(&mut self) {
        if let Some(running) = self.state.get_mut().as_ref() {
            running.cancel.cancel();
        }
    }
}

/// Clear a `Running` state whose task has already exited on its own, which
/// only happens if it panicked.
async fn reap_finished(state: &mut Option<RunningDaemon>) {
    let Some(running) = state.as_mut() else {
        return;
    };
    if !running.handle.is_finished() {
        return;
    }

    match (&mut running.handle).await {
        Err(e) => tracing::error!(target = %running.range, error = %e, "Polling task died"),
        Ok(()) => tracing::warn!(target = %running.range, "Polling task exited unexpectedly"),
    }
    *state = None;
}

/// Counts a polling task as alive for as long as it is held.
struct TaskGuard(Arc<AtomicUsize>);

impl TaskGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn poll_loop(
    prober: Arc<dyn Prober>,
    store: Arc<TopologyStore>,
    range: String,
    interval: watch::Receiver<i64>,
    cancel: CancellationToken,
    _guard: TaskGuard,
) {
    loop {
        run_cycle(prober.as_ref(), &store, &range).await;

        let secs = *interval.borrow();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait_duration(secs)) => {}
        }
    }
    tracing::debug!(target = %range, "Polling task exited");
}

/// One scan → store cycle. Scan failures are stored, not propagated.
pub async fn run_cycle(prober: &dyn Prober, store: &TopologyStore, range: &str) {
    tracing::debug!(target = %range, "Updating topology");

    let snapshot = match prober.scan(range).await {
        Ok(topology) => {
            tracing::info!(
                target = %range,
                devices = topology.devices.len(),
                connections = topology.connections.len(),
                "Topology updated"
            );
            Snapshot::from(topology)
        }
        Err(e) => {
            tracing::warn!(target = %range, error = %e, "Scan failed; recording error snapshot");
            Snapshot::failed(e.to_string())
        }
    };

    if let Err(e) = store.set(snapshot) {
        tracing::error!(error = %e, "Failed to persist topology");
    }
}

fn wait_duration(secs: i64) -> Duration {
    Duration::from_secs(u64::try_from(secs).unwrap_or(0))
}
