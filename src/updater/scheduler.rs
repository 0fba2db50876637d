//! Periodic and on-demand update checks.
//!
//! After an optional startup delay one cycle runs, then one per interval, plus one for
//! every [`Scheduler::trigger`]. Each cycle runs on its own task so the timer loop never
//! waits on the network; overlapping cycles are dropped by the orchestrator's busy flag.

use crate::config::UpdaterConfig;
use crate::updater::orchestrator::UpdateOrchestrator;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// One unit of scheduled work.
pub trait UpdateCycle: Send + Sync + 'static {
    fn run_cycle(&self) -> impl Future<Output = ()> + Send;
}

impl UpdateCycle for UpdateOrchestrator {
    async fn run_cycle(&self) {
        match self.check_and_maybe_install().await {
            Some(result) => debug!(outcome = ?result.outcome, "scheduled check finished"),
            None => debug!("scheduled check dropped, orchestrator busy"),
        }
    }
}

pub struct Scheduler<C: UpdateCycle> {
    cycle: Arc<C>,
    startup_delay: Option<Duration>,
    interval: Option<Duration>,
    trigger: Arc<Notify>,
    stop_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<C: UpdateCycle> Scheduler<C> {
    /// `startup_delay == None` skips the initial check; `interval == None` disables the
    /// recurring timer.
    pub fn new(cycle: Arc<C>, startup_delay: Option<Duration>, interval: Option<Duration>) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            cycle,
            startup_delay,
            interval,
            trigger: Arc::new(Notify::new()),
            stop_tx,
            handle: Mutex::new(None),
        }
    }

    /// Schedule from the `[updater]` config section.
    pub fn from_config(cycle: Arc<C>, config: &UpdaterConfig) -> Self {
        let startup = config.check_on_startup.then(|| config.startup_delay());
        Self::new(cycle, startup, config.check_interval())
    }

    /// Start the timer loop. A second call while running does nothing.
    pub fn start(&self) {
        let Ok(mut handle) = self.handle.lock() else {
            return;
        };
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("scheduler already running");
            return;
        }

        self.stop_tx.send_replace(false);
        let stop_rx = self.stop_tx.subscribe();
        info!(startup_delay = ?self.startup_delay, interval = ?self.interval, "starting update scheduler");
        *handle = Some(tokio::spawn(run_loop(
            Arc::clone(&self.cycle),
            self.startup_delay,
            self.interval,
            Arc::clone(&self.trigger),
            stop_rx,
        )));
    }

    /// Request an immediate cycle.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    /// Cancel the timer. Cycles already running finish on their own.
    pub async fn stop(&self) {
        self.stop_tx.send_replace(true);
        let handle = self.handle.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!("scheduler task ended abnormally: {e}");
        }
        info!("update scheduler stopped");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .map(|h| h.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

fn spawn_cycle<C: UpdateCycle>(cycle: &Arc<C>) {
    let cycle = Arc::clone(cycle);
    tokio::spawn(async move { cycle.run_cycle().await });
}

async fn run_loop<C: UpdateCycle>(
    cycle: Arc<C>,
    startup_delay: Option<Duration>,
    interval: Option<Duration>,
    trigger: Arc<Notify>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let startup = tokio::time::sleep(startup_delay.unwrap_or_default());
    tokio::pin!(startup);
    let mut startup_pending = startup_delay.is_some();

    let mut ticker = interval.map(|period| {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            () = &mut startup, if startup_pending => {
                startup_pending = false;
                debug!("startup check");
                spawn_cycle(&cycle);
            }
            () = trigger.notified() => {
                debug!("on-demand check");
                spawn_cycle(&cycle);
            }
            () = next_tick(ticker.as_mut()) => {
                debug!("scheduled check");
                spawn_cycle(&cycle);
            }
        }
    }
}

async fn next_tick(ticker: Option<&mut tokio::time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
