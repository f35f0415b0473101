//! # mediafetch
//!
//! Fetch remote media as MP3 audio or size-bounded MP4 video, hand each
//! artifact to a client once, and reclaim whatever is left behind.
//!
//! ## Overview
//!
//! - **Acquisition pipeline** - validate the source, probe its metadata, run
//!   the extractor under a collision-resistant working name, identify the
//!   produced file and give it a human-readable final name
//! - **Admission policy** - duration limit before download, size limits after
//! - **Retention sweeper** - background removal of aged artifacts
//! - **Service boundary** - a small axum REST API with SSE events
//!
//! Concurrent acquisitions share one directory without locks: every attempt
//! attributes output through directory snapshots and its own working prefix,
//! and finalization never overwrites an existing file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mediafetch::{AcquisitionRequest, Config, MediaFetcher, TargetFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = MediaFetcher::new(Config::default()).await?;
//!     fetcher.start_sweeper().await;
//!
//!     let artifact = fetcher
//!         .acquire(&AcquisitionRequest::new(
//!             "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
//!             TargetFormat::Audio,
//!         ))
//!         .await?;
//!     println!("ready: {}", artifact.file_name());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Duration and size limits
pub mod admission;
/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Media extraction backends
pub mod extractor;
/// Service facade (decomposed into focused submodules)
pub mod fetcher;
/// Working and final file names
pub mod naming;
/// Acquisition pipeline
pub mod pipeline;
/// Output identification and finalization
pub mod resolver;
/// Source URL validation
pub mod source;
/// Shared artifact directory
pub mod store;
/// Retention sweeper
pub mod sweeper;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use admission::{Admission, AdmissionPolicy};
pub use config::Config;
pub use error::{ApiError, Error, Result, ToHttpStatus};
pub use extractor::{Extractor, NoOpExtractor, YtDlpExtractor};
pub use fetcher::{MediaFetcher, ServedArtifact};
pub use pipeline::Pipeline;
pub use resolver::ArtifactResolver;
pub use store::{ArtifactStore, FsStore, MemoryStore};
pub use sweeper::RetentionSweeper;
pub use types::{
    AcquisitionRequest, Artifact, DirectorySnapshot, Event, FileInfo, SourceMetadata,
    SweepReport, TargetFormat, WorkingName,
};

/// Helper function to run the fetcher with graceful signal handling.
///
/// Waits for a termination signal and then calls the fetcher's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use mediafetch::{Config, MediaFetcher, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let fetcher = MediaFetcher::new(Config::default()).await?;
///     let _api = fetcher.spawn_api_server();
///
///     run_with_shutdown(&fetcher).await;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(fetcher: &MediaFetcher) {
    wait_for_signal().await;
    fetcher.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
