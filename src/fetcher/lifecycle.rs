//! Shutdown coordination.

use crate::types::Event;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::MediaFetcher;

/// How long shutdown waits for a sweep in progress
const SWEEPER_STOP_TIMEOUT: Duration = Duration::from_secs(10);

impl MediaFetcher {
    /// Gracefully shut down the fetcher
    ///
    /// 1. Stops accepting new acquisitions
    /// 2. Cancels the retention sweeper and waits for it to stop (10 seconds)
    /// 3. Emits [`Event::Shutdown`]
    ///
    /// Acquisitions already in progress are not interrupted.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");

        self.tasks.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new downloads");

        self.tasks.sweeper_cancel.cancel();
        let handle = self.tasks.sweeper_handle.lock().await.take();
        if let Some(handle) = handle {
            match tokio::time::timeout(SWEEPER_STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => tracing::info!("Retention sweeper stopped"),
                Ok(Err(e)) => tracing::warn!(error = %e, "Retention sweeper task failed"),
                Err(_) => tracing::warn!("Timeout waiting for retention sweeper to stop"),
            }
        }

        self.emit_event(Event::Shutdown);
        tracing::info!("Graceful shutdown complete");
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::error::Error;
    use crate::extractor::NoOpExtractor;
    use crate::fetcher::MediaFetcher;
    use crate::store::MemoryStore;
    use crate::types::{AcquisitionRequest, Event, TargetFormat};
    use std::sync::Arc;

    fn fetcher() -> MediaFetcher {
        MediaFetcher::with_components(
            Config::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(NoOpExtractor),
        )
    }

    #[tokio::test]
    async fn shutdown_refuses_new_acquisitions() {
        let fetcher = fetcher();
        fetcher.shutdown().await;

        let err = fetcher
            .acquire(&AcquisitionRequest::new(
                "https://youtu.be/dQw4w9WgXcQ",
                TargetFormat::Audio,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ShuttingDown));
    }

    #[tokio::test]
    async fn shutdown_stops_sweeper_and_emits_event() {
        let fetcher = fetcher();
        let mut events = fetcher.subscribe();
        assert!(fetcher.start_sweeper().await);

        fetcher.shutdown().await;

        assert!(fetcher.tasks.sweeper_cancel.is_cancelled());
        assert!(fetcher.tasks.sweeper_handle.lock().await.is_none());
        assert!(matches!(events.recv().await.unwrap(), Event::Shutdown));
    }

    #[tokio::test]
    async fn sweeper_respects_disabled_retention() {
        let mut config = Config::default();
        config.retention.enabled = false;
        let fetcher = MediaFetcher::with_components(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(NoOpExtractor),
        );

        assert!(!fetcher.start_sweeper().await);
        assert!(fetcher.tasks.sweeper_handle.lock().await.is_none());
    }

    #[tokio::test]
    async fn sweeper_refuses_zero_interval() {
        let mut config = Config::default();
        config.retention.sweep_interval = std::time::Duration::ZERO;
        let fetcher = MediaFetcher::with_components(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(NoOpExtractor),
        );

        assert!(!fetcher.start_sweeper().await);
        assert!(fetcher.tasks.sweeper_handle.lock().await.is_none());
        fetcher.shutdown().await;
    }
}
