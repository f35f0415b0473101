//! Traits for media extraction backends

use crate::types::{SourceMetadata, TargetFormat, WorkingName};
use async_trait::async_trait;
use std::path::Path;

/// Probes a source URL and performs fetch plus transcode into a local file
///
/// The produced file's name and container are chosen by the backend; callers
/// attribute output through directory snapshots, never through a return value.
///
/// # Examples
///
/// ```no_run
/// use mediafetch::config::ExtractorConfig;
/// use mediafetch::extractor::{Extractor, YtDlpExtractor};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = YtDlpExtractor::from_path(&ExtractorConfig::default())
///     .expect("yt-dlp not found in PATH");
///
/// let meta = extractor.probe("https://youtu.be/dQw4w9WgXcQ").await?;
/// println!("{} ({:?}s)", meta.title, meta.duration_secs);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Fetch metadata only, without downloading media
    ///
    /// # Errors
    ///
    /// [`crate::Error::AcquisitionFailed`] with the backend's message.
    async fn probe(&self, url: &str) -> crate::Result<SourceMetadata>;

    /// Download and transcode `url` into `output_dir`, naming output after
    /// `working`'s template
    ///
    /// # Errors
    ///
    /// [`crate::Error::AcquisitionFailed`] with the backend's message.
    async fn fetch(
        &self,
        url: &str,
        format: TargetFormat,
        working: &WorkingName,
        output_dir: &Path,
    ) -> crate::Result<()>;

    /// Extensions this backend may leave behind for `format`, without dots
    fn possible_extensions(&self, format: TargetFormat) -> &'static [&'static str];

    /// Get the name of this backend
    fn name(&self) -> &'static str;
}
