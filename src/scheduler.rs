use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

pub const PROTOCOL_REFRESH_PERIOD_MS: u64 = 100;
pub const TELEMETRY_PUBLISH_PERIOD_MS: u64 = 500;
pub const ERROR_BACKOFF_MS: u64 = 1000;

/// Outcome of one pass over a task's entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub refreshed: usize,
    pub failed: usize,
}

/// Work driven on a fixed cadence by [`run_periodic`].
pub trait PeriodicTask: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// One full pass. Must not hold a lock across all entries.
    fn run_pass(&self) -> PassReport;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub period: Duration,
    pub error_backoff: Duration,
}

impl Cadence {
    pub fn new(period: Duration, error_backoff: Duration) -> Self {
        Self { period, error_backoff }
    }

    /// 10 Hz protocol table refresh.
    pub fn protocol() -> Self {
        Self::new(
            Duration::from_millis(PROTOCOL_REFRESH_PERIOD_MS),
            Duration::from_millis(ERROR_BACKOFF_MS),
        )
    }

    /// 2 Hz room telemetry.
    pub fn telemetry() -> Self {
        Self::new(
            Duration::from_millis(TELEMETRY_PUBLISH_PERIOD_MS),
            Duration::from_millis(ERROR_BACKOFF_MS),
        )
    }
}

/// Sending half of the cancellation context.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // send_replace never fails, even with no receivers left
        self.tx.send_replace(true);
    }

    pub fn subscribe(&self) -> Shutdown {
        Shutdown { rx: self.tx.subscribe() }
    }
}

/// Cancellation context handed to every loop; observed between ticks.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested or the trigger is dropped.
    pub async fn triggered(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    pub passes: u64,
    pub lagging_passes: u64,
    pub refreshed_entries: u64,
    pub failed_entries: u64,
    pub backoffs: u64,
}

impl LoopStats {
    fn record(&mut self, report: PassReport) {
        self.passes += 1;
        self.refreshed_entries += report.refreshed as u64;
        self.failed_entries += report.failed as u64;
    }
}

/// Drive `task` every `cadence.period` until `shutdown` fires.
///
/// Passes never overlap. An overrunning pass is followed immediately by the
/// next one (no catch-up burst). A pass with failed entries, or one that
/// panics outright, is followed by `cadence.error_backoff` before the next tick.
pub async fn run_periodic<T>(task: Arc<T>, cadence: Cadence, mut shutdown: Shutdown) -> LoopStats
where
    T: PeriodicTask + ?Sized,
{
    let name = task.name();
    let mut stats = LoopStats::default();
    let mut interval = time::interval(cadence.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(task = name, period_ms = cadence.period.as_millis() as u64, "refresh loop started");

    loop {
        tokio::select! {
            biased;
            () = shutdown.triggered() => break,
            _ = interval.tick() => {}
        }

        let started = Instant::now();
        let report = match panic::catch_unwind(AssertUnwindSafe(|| task.run_pass())) {
            Ok(report) => report,
            Err(_) => {
                error!(task = name, "refresh pass panicked");
                PassReport { refreshed: 0, failed: 1 }
            }
        };
        let elapsed = started.elapsed();
        stats.record(report);

        if elapsed > cadence.period {
            stats.lagging_passes += 1;
            warn!(
                task = name,
                elapsed_ms = elapsed.as_millis() as u64,
                period_ms = cadence.period.as_millis() as u64,
                "refresh pass took longer than its period"
            );
        }

        if report.failed > 0 {
            stats.backoffs += 1;
            warn!(
                task = name,
                failed = report.failed,
                backoff_ms = cadence.error_backoff.as_millis() as u64,
                "backing off after failed pass"
            );
            tokio::select! {
                biased;
                () = shutdown.triggered() => break,
                () = time::sleep(cadence.error_backoff) => {}
            }
            interval.reset();
        }
    }

    info!(
        task = name,
        passes = stats.passes,
        lagging = stats.lagging_passes,
        failed_entries = stats.failed_entries,
        "refresh loop stopped"
    );
    stats
}
