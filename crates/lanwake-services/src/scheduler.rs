//! Polling Scheduler: one background loop probing due endpoints.
//!
//! Each tick takes a due snapshot under the registry lock, releases it, then
//! probes the due endpoints one after another inside the scheduler task. A
//! slow host therefore delays the hosts after it in the same tick; the worst
//! case tick is the sum of the due endpoints' timeouts times their attempt
//! counts.
//!
//! Shutdown is checked between ticks. A tick in progress always completes,
//! so stop never leaves the lock held or a scan half done.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use lanwake_core::EngineError;

use crate::prober::{probe_target, Prober};
use crate::registry::Registry;

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Endpoints found due.
    pub due: usize,
    /// Probes whose result was applied.
    pub probed: usize,
    pub online: usize,
    pub offline: usize,
    /// Due endpoints removed, disabled or unreachable through the lock
    /// before their result could be applied.
    pub skipped: usize,
}

pub struct Scheduler<P> {
    registry: Arc<Registry>,
    prober: P,
    tick: Duration,
}

impl<P: Prober> Scheduler<P> {
    pub fn new(registry: Arc<Registry>, prober: P, tick: Duration) -> Self {
        Self {
            registry,
            prober,
            tick,
        }
    }

    /// Scan once and probe everything due.
    pub async fn tick(&self) -> TickReport {
        let due = match self.registry.due(Instant::now()).await {
            Ok(due) => due,
            Err(e) => {
                tracing::warn!(error = %e, "tick skipped");
                return TickReport::default();
            }
        };

        let mut report = TickReport {
            due: due.len(),
            ..TickReport::default()
        };

        for target in &due {
            // The snapshot may be stale by now.
            match self.registry.is_enabled(&target.name).await {
                Ok(false) | Err(EngineError::NotFound(_)) => {
                    tracing::debug!(device = %target.name, "no longer probeable, skipped");
                    report.skipped += 1;
                    continue;
                }
                _ => {}
            }

            let outcome = probe_target(&self.prober, target).await;
            match self.registry.update_status(&target.name, outcome).await {
                Ok(_) => {
                    report.probed += 1;
                    if outcome.reachable {
                        report.online += 1;
                    } else {
                        report.offline += 1;
                    }
                }
                Err(e @ (EngineError::NotFound(_) | EngineError::Disabled(_))) => {
                    tracing::debug!(device = %target.name, reason = %e, "result dropped");
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(device = %target.name, error = %e, "failed to record probe result");
                    report.skipped += 1;
                }
            }
        }

        report
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(tick = ?self.tick, "scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = interval.tick() => {
                    let started = Instant::now();
                    let report = self.tick().await;
                    if report.due > 0 {
                        tracing::debug!(
                            due = report.due,
                            online = report.online,
                            offline = report.offline,
                            skipped = report.skipped,
                            elapsed = ?started.elapsed(),
                            "tick complete"
                        );
                    }
                }
            }
        }

        tracing::info!("scheduler stopped");
    }
}

/// A running scheduler task.
pub struct SchedulerHandle {
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
    running: Arc<AtomicBool>,
}

impl SchedulerHandle {
    /// Spawn the loop on the current runtime. Outside a runtime this fails,
    /// and the caller has nothing to monitor with.
    pub fn spawn<P>(scheduler: Scheduler<P>) -> Result<Self, tokio::runtime::TryCurrentError>
    where
        P: Prober + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()?;
        let (shutdown, rx) = broadcast::channel(1);
        let running = Arc::new(AtomicBool::new(true));

        let flag = running.clone();
        let task = runtime.spawn(async move {
            scheduler.run(rx).await;
            flag.store(false, Ordering::SeqCst);
        });

        Ok(Self {
            shutdown,
            task,
            running,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.task.is_finished()
    }

    /// Shared flag that turns false once the loop exits.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Signal shutdown and wait for the current tick to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "scheduler task ended abnormally");
        }
        self.running.store(false, Ordering::SeqCst);
    }
}
