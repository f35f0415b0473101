//! Background service starters: retention sweeper.

use crate::sweeper::RetentionSweeper;
use crate::types::SweepReport;

use super::MediaFetcher;

impl MediaFetcher {
    /// Start the retention sweeper background task
    ///
    /// Idempotent while the sweeper is running. Returns `false` if retention
    /// is disabled or the sweep interval is zero.
    pub async fn start_sweeper(&self) -> bool {
        if !self.config.retention.enabled {
            tracing::info!("Retention disabled, skipping sweeper");
            return false;
        }
        if self.config.retention.sweep_interval.is_zero() {
            tracing::error!("retention.sweep_interval is zero, skipping sweeper");
            return false;
        }

        let mut handle = self.tasks.sweeper_handle.lock().await;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return true;
        }

        let sweeper = self.sweeper();
        *handle = Some(sweeper.spawn(self.tasks.sweeper_cancel.clone()));
        true
    }

    /// Run one retention sweep immediately
    pub async fn sweep_now(&self) -> SweepReport {
        self.sweeper().sweep_once().await
    }

    fn sweeper(&self) -> RetentionSweeper {
        RetentionSweeper::new(
            &self.config.retention,
            self.store.clone(),
            self.event_tx.clone(),
        )
    }
}
