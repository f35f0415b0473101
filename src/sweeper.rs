//! Retention sweeper
//!
//! Deletes artifacts whose last modification is older than the configured age.
//! Runs on its own interval, independent of acquisitions, until cancelled.
//! Only files whose age was verified in the current scan are deleted.

use crate::config::RetentionConfig;
use crate::store::ArtifactStore;
use crate::types::{Event, SweepReport};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Periodic reclaimer of aged artifacts
#[derive(Clone)]
pub struct RetentionSweeper {
    store: Arc<dyn ArtifactStore>,
    interval: Duration,
    max_age: Duration,
    event_tx: broadcast::Sender<Event>,
}

impl RetentionSweeper {
    /// Create a sweeper over `store`
    pub fn new(
        config: &RetentionConfig,
        store: Arc<dyn ArtifactStore>,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            store,
            interval: config.sweep_interval,
            max_age: config.max_age,
            event_tx,
        }
    }

    /// Run a single sweep against the current time
    pub async fn sweep_once(&self) -> SweepReport {
        self.sweep_once_at(SystemTime::now()).await
    }

    /// Run a single sweep treating `now` as the current time.
    ///
    /// Never fails: listing, stat and delete errors are logged and the file
    /// is skipped (or recorded in [`SweepReport::failed`]).
    pub async fn sweep_once_at(&self, now: SystemTime) -> SweepReport {
        let mut report = SweepReport::default();

        let names = match self.store.list().await {
            Ok(names) => names,
            Err(e) => {
                tracing::error!(error = %e, "retention sweep could not list artifacts");
                return report;
            }
        };

        for name in names {
            report.scanned += 1;

            let modified = match self.store.stat(&name).await {
                Ok(stat) => stat.modified,
                Err(e) => {
                    // already served or deleted concurrently
                    tracing::debug!(filename = %name, error = %e, "skipping artifact during sweep");
                    continue;
                }
            };

            // modification times in the future count as fresh
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age <= self.max_age {
                continue;
            }

            match self.store.delete(&name).await {
                Ok(()) => {
                    tracing::info!(filename = %name, age_secs = age.as_secs(), "deleted aged artifact");
                    report.deleted.push(name);
                }
                Err(crate::Error::NotFound(_)) => {
                    tracing::debug!(filename = %name, "artifact vanished before deletion");
                }
                Err(e) => {
                    tracing::warn!(filename = %name, error = %e, "failed to delete aged artifact");
                    report.failed.push(name);
                }
            }
        }

        tracing::debug!(
            scanned = report.scanned,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "retention sweep complete"
        );
        self.event_tx
            .send(Event::SweepComplete {
                scanned: report.scanned,
                deleted: report.deleted.len(),
                failed: report.failed.len(),
            })
            .ok();

        report
    }

    /// Spawn the periodic loop. The first sweep runs one interval after start.
    ///
    /// The task exits when `cancel_token` is cancelled; a sweep in progress is
    /// finished first. A zero interval is refused and the task exits at once.
    pub fn spawn(self, cancel_token: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if self.interval.is_zero() {
                tracing::error!("retention sweep interval is zero, sweeper not started");
                return;
            }
            let start = tokio::time::Instant::now() + self.interval;
            let mut interval = tokio::time::interval_at(start, self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_secs = self.interval.as_secs(),
                max_age_secs = self.max_age.as_secs(),
                "retention sweeper started"
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.sweep_once().await;
                    }
                    _ = cancel_token.cancelled() => {
                        tracing::info!("retention sweeper stopped");
                        break;
                    }
                }
            }
        })
    }
}
