//! The monitoring controller: a `Stopped`/`Running` state machine that owns
//! at most one recurring check job at a time.
//!
//! `start` replaces any active job (cancelling it first), persists the run
//! flag, and spawns a ticker task that drives one check cycle per interval
//! tick. `stop` persists the flag off and cancels cooperatively — an
//! in-flight fetch is aborted rather than waited out. Cycles are awaited
//! sequentially inside the task and the ticker delays missed ticks, so an
//! overrunning cycle can never overlap the next one.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::alert::{sink_from_config, AlertSink};
use crate::config::MonitorConfig;
use crate::cycle::{self, CycleError};
use crate::fetcher::PageFetcher;
use crate::status::{self, DaemonStatus, LastOutcome, MonitorState};
use crate::store::ConfigStore;

/// The currently scheduled recurring job. Owned exclusively by the
/// [`Scheduler`]; exactly one exists at a time.
struct RunHandle {
    id: Uuid,
    /// Setting this to `true` signals the ticker task and any in-flight
    /// cycle to stop.
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RunHandle {
    /// Signals the run to stop and waits for the task to finish.
    async fn stop(self) {
        let _ = self.cancel_tx.send(true);
        let _ = self.task.await;
    }
}

/// Owns the run lifecycle. `Stopped` is the initial state and is safely
/// re-enterable; both `start` and `stop` are idempotent in effect.
pub struct Scheduler {
    store: ConfigStore,
    fetcher: Arc<PageFetcher>,
    status: Arc<Mutex<DaemonStatus>>,
    status_path: PathBuf,
    /// When set, every run uses this sink instead of deriving one from the
    /// config's webhook setting.
    sink_override: Option<Arc<dyn AlertSink>>,
    active: Option<RunHandle>,
}

impl Scheduler {
    pub fn new(store: ConfigStore, status_path: PathBuf) -> Self {
        let scheduler = Self {
            store,
            fetcher: Arc::new(PageFetcher::new()),
            status: Arc::new(Mutex::new(DaemonStatus::new())),
            status_path,
            sink_override: None,
            active: None,
        };
        // Publish the initial stopped status right away so the UI has a
        // file to read before the first transition.
        scheduler.write_state(MonitorState::Stopped);
        scheduler
    }

    /// Like [`Scheduler::new`] but with a fixed alert sink.
    pub fn with_sink(store: ConfigStore, status_path: PathBuf, sink: Arc<dyn AlertSink>) -> Self {
        Self {
            sink_override: Some(sink),
            ..Self::new(store, status_path)
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Opaque id of the active run, if any.
    pub fn active_run_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|h| h.id)
    }

    /// Starts (or restarts) monitoring with `config`.
    ///
    /// Any existing run is cancelled first, so calling this twice in a row
    /// leaves exactly one active schedule reflecting the latest config.
    pub async fn start(&mut self, config: &MonitorConfig) -> Result<()> {
        config
            .target()
            .ok_or_else(|| anyhow!("url and word must be set before starting"))?;

        if let Some(previous) = self.active.take() {
            debug!(run_id = %previous.id, "Cancelling previous run");
            previous.stop().await;
        }

        // The running cycles read url/word back from the store, so persist
        // the whole config being started, not just the flag — one source of
        // truth for the schedule.
        let mut persisted = config.clone();
        persisted.running = true;
        self.store.save(&persisted)?;

        let id = Uuid::new_v4();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let sink = match &self.sink_override {
            Some(sink) => Arc::clone(sink),
            None => sink_from_config(config.webhook_url.as_deref()),
        };

        let task = tokio::spawn(run_schedule(
            id,
            self.store.clone(),
            Arc::clone(&self.fetcher),
            sink,
            config.interval_minutes.period(),
            Arc::clone(&self.status),
            self.status_path.clone(),
            cancel_rx,
        ));

        info!(
            run_id = %id,
            url = %config.url,
            interval_minutes = config.interval_minutes.minutes(),
            "Monitoring started"
        );
        self.active = Some(RunHandle { id, cancel_tx, task });
        self.write_state(MonitorState::Running);
        Ok(())
    }

    /// Stops monitoring: persists the run flag off and cancels the active
    /// run, including any in-flight cycle. Safe to call when already stopped.
    pub async fn stop(&mut self) -> Result<()> {
        self.store.set_running(false)?;

        if let Some(handle) = self.active.take() {
            info!(run_id = %handle.id, "Monitoring stopped");
            handle.stop().await;
        }
        self.write_state(MonitorState::Stopped);
        Ok(())
    }

    /// Daemon shutdown: cancels the active run but leaves the durable run
    /// flag untouched, so a restarted daemon resumes a running monitor.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.active.take() {
            debug!(run_id = %handle.id, "Shutting down active run");
            handle.stop().await;
        }
        self.write_state(MonitorState::Stopped);
    }

    fn write_state(&self, state: MonitorState) {
        let mut s = self.status.lock().unwrap();
        s.state = state;
        status::write_status(&self.status_path, &s);
    }
}

/// The recurring job body: one check cycle per tick until cancelled.
///
/// The first tick completes immediately, so a fresh run checks right away.
/// A cycle observing the run flag off without an explicit `stop()` is a
/// benign no-op and the schedule keeps ticking — only `stop()` halts it.
#[allow(clippy::too_many_arguments)]
async fn run_schedule(
    run_id: Uuid,
    store: ConfigStore,
    fetcher: Arc<PageFetcher>,
    sink: Arc<dyn AlertSink>,
    period: Duration,
    status: Arc<Mutex<DaemonStatus>>,
    status_path: PathBuf,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = cancel_rx.changed() => {
                // A cancel signal or a dropped sender both end the run.
                if changed.is_err() || *cancel_rx.borrow() {
                    break;
                }
                continue;
            }
        }
        if *cancel_rx.borrow() {
            break;
        }

        let mut cycle_cancel = cancel_rx.clone();
        match cycle::run_cycle(&store, &fetcher, sink.as_ref(), &mut cycle_cancel).await {
            Ok(report) => {
                debug!(run_id = %run_id, matched = report.matched, "Cycle completed");
                let outcome = if report.matched {
                    LastOutcome::Matched
                } else {
                    LastOutcome::NoMatch
                };
                let mut s = status.lock().unwrap();
                s.record_cycle(outcome, None);
                status::write_status(&status_path, &s);
            }
            Err(CycleError::Cancelled) => {
                debug!(run_id = %run_id, "Cycle cancelled");
                if *cancel_rx.borrow() {
                    break;
                }
            }
            Err(e) => {
                // Absorbed: the schedule continues to the next tick.
                warn!(run_id = %run_id, error = %e, "Cycle failed");
                let mut s = status.lock().unwrap();
                s.record_cycle(LastOutcome::Failed, Some(e.to_string()));
                status::write_status(&status_path, &s);
            }
        }
    }

    debug!(run_id = %run_id, "Schedule task finished");
}
