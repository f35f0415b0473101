//! Extractor used when no backend is available

use super::traits::Extractor;
use crate::types::{SourceMetadata, TargetFormat, WorkingName};
use async_trait::async_trait;
use std::path::Path;

const UNAVAILABLE: &str = "no extractor available: yt-dlp was not found. \
     Configure extractor.ytdlp_path or ensure yt-dlp is in PATH.";

/// Extractor that fails every call
///
/// Lets the service start and serve existing artifacts when yt-dlp is missing;
/// acquisitions fail with [`crate::Error::AcquisitionFailed`].
///
/// # Examples
///
/// ```
/// use mediafetch::extractor::{Extractor, NoOpExtractor};
///
/// # #[tokio::main]
/// # async fn main() {
/// let extractor = NoOpExtractor;
/// assert!(extractor.probe("https://youtu.be/abc").await.is_err());
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpExtractor;

#[async_trait]
impl Extractor for NoOpExtractor {
    async fn probe(&self, _url: &str) -> crate::Result<SourceMetadata> {
        Err(crate::Error::AcquisitionFailed(UNAVAILABLE.into()))
    }

    async fn fetch(
        &self,
        _url: &str,
        _format: TargetFormat,
        _working: &WorkingName,
        _output_dir: &Path,
    ) -> crate::Result<()> {
        Err(crate::Error::AcquisitionFailed(UNAVAILABLE.into()))
    }

    fn possible_extensions(&self, _format: TargetFormat) -> &'static [&'static str] {
        &[]
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
