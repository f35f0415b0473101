//! Acquisition pipeline
//!
//! One call turns a source URL into a finalized artifact in the shared store:
//!
//! 1. validate the URL shape (no I/O)
//! 2. snapshot the store
//! 3. probe metadata and apply the duration half of admission
//! 4. fetch with the working output template, bounded by a deadline
//! 5. snapshot again and resolve the produced file
//! 6. apply the size half of admission, deleting the artifact on violation
//! 7. rename to the sanitized title with collision suffixing
//!
//! Every failure is terminal for the call. Nothing is retried.

use crate::admission::{Admission, AdmissionPolicy};
use crate::config::{Config, ResolverConfig};
use crate::error::{Error, Result, ToHttpStatus};
use crate::extractor::Extractor;
use crate::naming::{make_final_name, make_working_prefix};
use crate::resolver::ArtifactResolver;
use crate::source::validate_source_url;
use crate::store::{ArtifactStore, snapshot};
use crate::types::{AcquisitionRequest, Artifact, Event, TargetFormat, WorkingName};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Orchestrates extractor, admission and resolver for single acquisitions
///
/// Cheap to share: all state is immutable or behind `Arc`. Concurrent calls
/// coordinate only through their distinct working prefixes.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn ArtifactStore>,
    extractor: Arc<dyn Extractor>,
    admission: AdmissionPolicy,
    resolver_config: ResolverConfig,
    fetch_timeout: Duration,
    min_free_space: u64,
    event_tx: broadcast::Sender<Event>,
}

impl Pipeline {
    /// Create a pipeline over `store` and `extractor`
    pub fn new(
        config: &Config,
        store: Arc<dyn ArtifactStore>,
        extractor: Arc<dyn Extractor>,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            store,
            extractor,
            admission: AdmissionPolicy::new(config.admission.clone()),
            resolver_config: config.resolver.clone(),
            fetch_timeout: config.extractor.timeout,
            min_free_space: config.storage.min_free_space,
            event_tx,
        }
    }

    /// Admission policy in effect
    pub fn admission(&self) -> &AdmissionPolicy {
        &self.admission
    }

    /// Run one acquisition to completion.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSource`] before any I/O
    /// - [`Error::DurationExceeded`] / [`Error::DurationUnknown`] after the probe
    /// - [`Error::AcquisitionFailed`] for any extractor failure or timeout
    /// - [`Error::NoNewFiles`] / [`Error::UnresolvedOutput`] from resolution
    /// - [`Error::SizeExceeded`] after the artifact was deleted
    pub async fn acquire(&self, request: &AcquisitionRequest) -> Result<Artifact> {
        match self.run(request).await {
            Ok(artifact) => Ok(artifact),
            Err(e) => {
                tracing::warn!(
                    url = %request.source_url,
                    format = %request.target_format,
                    error = %e,
                    "acquisition failed"
                );
                self.emit(Event::AcquisitionFailed {
                    url: request.source_url.clone(),
                    code: e.error_code().to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run(&self, request: &AcquisitionRequest) -> Result<Artifact> {
        let format = request.target_format;
        let url = validate_source_url(&request.source_url)?;
        let url = url.as_str();

        self.check_disk_space().await?;

        let working = make_working_prefix(format);
        tracing::info!(url = %url, format = %format, prefix = %working.prefix, "starting acquisition");
        self.emit(Event::AcquisitionStarted {
            url: request.source_url.clone(),
            format,
            prefix: working.prefix.clone(),
        });

        let before = snapshot(self.store.as_ref()).await?;

        let metadata = self.extractor.probe(url).await.map_err(opaque)?;
        tracing::debug!(
            prefix = %working.prefix,
            title = %metadata.title,
            duration_secs = ?metadata.duration_secs,
            "metadata probed"
        );
        self.emit(Event::MetadataProbed {
            prefix: working.prefix.clone(),
            title: metadata.title.clone(),
            duration_secs: metadata.duration_secs,
        });

        self.admission
            .check_duration(format, metadata.duration_secs)
            .into_result(format)?;

        self.fetch(url, format, &working).await?;

        let after = snapshot(self.store.as_ref()).await?;
        let final_name = make_final_name(&metadata.title, &working.target_extension);
        let resolver = ArtifactResolver::new(&self.resolver_config)
            .with_extensions(self.extractor.possible_extensions(format));

        let artifact = resolver
            .resolve(self.store.as_ref(), &before, &after, &working, &final_name)
            .await?;

        if let Admission::Rejected(reason) = self.admission.check_size(format, artifact.size_bytes)
        {
            let name = artifact.file_name();
            if let Err(e) = self.store.delete(&name).await {
                tracing::warn!(filename = %name, error = %e, "failed to delete oversized artifact");
            }
            return Err(reason.into_error(format));
        }

        let artifact = resolver
            .finalize(self.store.as_ref(), &artifact, &final_name)
            .await?;

        let filename = artifact.file_name();
        tracing::info!(
            prefix = %working.prefix,
            filename = %filename,
            size_bytes = artifact.size_bytes,
            "acquisition complete"
        );
        self.emit(Event::AcquisitionComplete {
            prefix: working.prefix,
            filename,
            size_bytes: artifact.size_bytes,
        });

        Ok(artifact)
    }

    async fn fetch(&self, url: &str, format: TargetFormat, working: &WorkingName) -> Result<()> {
        let fetch = self
            .extractor
            .fetch(url, format, working, self.store.root());

        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(result) => result.map_err(opaque),
            Err(_) => Err(Error::AcquisitionFailed(format!(
                "timed out after {}s",
                self.fetch_timeout.as_secs()
            ))),
        }
    }

    async fn check_disk_space(&self) -> Result<()> {
        if self.min_free_space == 0 {
            return Ok(());
        }

        match self.store.available_space().await? {
            Some(available) if available < self.min_free_space => Err(Error::InsufficientSpace {
                required: self.min_free_space,
                available,
            }),
            _ => Ok(()),
        }
    }

    fn emit(&self, event: Event) {
        // no subscribers is fine
        self.event_tx.send(event).ok();
    }
}

/// Collapse any extractor failure into the single opaque pipeline error
fn opaque(e: Error) -> Error {
    match e {
        Error::AcquisitionFailed(_) => e,
        other => Error::AcquisitionFailed(other.to_string()),
    }
}
