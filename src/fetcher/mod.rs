//! Service facade tying store, extractor, pipeline and sweeper together.
//!
//! The `MediaFetcher` struct and its methods are organized by domain:
//! - [`serve`] - Artifact metadata and single-shot streaming
//! - [`services`] - Background service starters
//! - [`lifecycle`] - Shutdown coordination

mod lifecycle;
mod serve;
mod services;

pub use serve::{ServedArtifact, content_type_for};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::{Extractor, NoOpExtractor, YtDlpExtractor};
use crate::pipeline::Pipeline;
use crate::store::{ArtifactStore, FsStore};
use crate::types::{AcquisitionRequest, Artifact, Event};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Background task bookkeeping
#[derive(Clone)]
pub(crate) struct TaskState {
    /// Cancels the retention sweeper
    pub(crate) sweeper_cancel: CancellationToken,
    /// Handle of the running sweeper, if started
    pub(crate) sweeper_handle: Arc<tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>>,
    /// Cleared during shutdown so new acquisitions are refused
    pub(crate) accepting_new: Arc<AtomicBool>,
}

/// Main service instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct MediaFetcher {
    /// Configuration
    pub(crate) config: Arc<Config>,
    /// Shared artifact directory
    pub(crate) store: Arc<dyn ArtifactStore>,
    /// Extraction backend
    pub(crate) extractor: Arc<dyn Extractor>,
    /// Acquisition pipeline
    pub(crate) pipeline: Pipeline,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Background task bookkeeping
    pub(crate) tasks: TaskState,
}

impl MediaFetcher {
    /// Create a fetcher over the configured download directory.
    ///
    /// Creates the directory if needed and picks the extractor: the configured
    /// yt-dlp binary, one found in PATH, or [`NoOpExtractor`] when neither is
    /// available.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let store = FsStore::new(config.download_dir().clone()).await?;

        let extractor: Arc<dyn Extractor> = match YtDlpExtractor::from_config(&config.extractor) {
            Some(ytdlp) => {
                tracing::info!(binary = %ytdlp.binary_path().display(), "using yt-dlp extractor");
                Arc::new(ytdlp)
            }
            None => {
                tracing::warn!("yt-dlp not found; acquisitions will fail until it is installed");
                Arc::new(NoOpExtractor)
            }
        };

        Ok(Self::with_components(config, Arc::new(store), extractor))
    }

    /// Create a fetcher from explicit components
    pub fn with_components(
        config: Config,
        store: Arc<dyn ArtifactStore>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        // buffer of 1000 events; slow subscribers see RecvError::Lagged
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);
        let pipeline = Pipeline::new(&config, store.clone(), extractor.clone(), event_tx.clone());

        tracing::info!(
            store = store.name(),
            extractor = extractor.name(),
            root = %store.root().display(),
            "media fetcher initialized"
        );

        Self {
            config: Arc::new(config),
            store,
            extractor,
            pipeline,
            event_tx,
            tasks: TaskState {
                sweeper_cancel: CancellationToken::new(),
                sweeper_handle: Arc::new(tokio::sync::Mutex::new(None)),
                accepting_new: Arc::new(AtomicBool::new(true)),
            },
        }
    }

    /// Subscribe to lifecycle events
    ///
    /// Each subscriber receives all events independently.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mediafetch::{Config, MediaFetcher};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let fetcher = MediaFetcher::new(Config::default()).await?;
    ///
    ///     let mut events = fetcher.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "fetcher event");
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Shared artifact store
    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Name of the extraction backend in use
    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Whether new acquisitions are accepted
    pub fn is_accepting(&self) -> bool {
        self.tasks.accepting_new.load(Ordering::SeqCst)
    }

    /// Acquire `request` through the pipeline
    ///
    /// # Errors
    ///
    /// [`Error::ShuttingDown`] once [`MediaFetcher::shutdown`] has started, and
    /// every error of [`Pipeline::acquire`].
    pub async fn acquire(&self, request: &AcquisitionRequest) -> Result<Artifact> {
        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }
        self.pipeline.acquire(request).await
    }

    /// Emit an event to all subscribers
    pub(crate) fn emit_event(&self, event: Event) {
        // no receivers is fine
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    pub fn spawn_api_server(&self) -> tokio::task::JoinHandle<Result<()>> {
        let fetcher = Arc::new(self.clone());
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(fetcher, config).await })
    }
}
