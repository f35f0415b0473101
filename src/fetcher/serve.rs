//! Artifact metadata and single-shot streaming.

use crate::admission::size_mb;
use crate::error::{Error, Result};
use crate::naming::{split_extension, validate_served_name};
use crate::store::ArtifactReader;
use crate::types::{Event, FileInfo, TargetFormat};

use super::MediaFetcher;

/// An artifact opened for streaming to a client
pub struct ServedArtifact {
    /// Artifact file name
    pub filename: String,
    /// Size in bytes at the time it was opened
    pub size_bytes: u64,
    /// MIME type derived from the extension
    pub content_type: &'static str,
    /// Open handle; stays readable after the artifact is removed from the store
    pub reader: ArtifactReader,
    /// Whether the artifact was removed from the store
    pub removed: bool,
}

impl std::fmt::Debug for ServedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServedArtifact")
            .field("filename", &self.filename)
            .field("size_bytes", &self.size_bytes)
            .field("content_type", &self.content_type)
            .field("removed", &self.removed)
            .finish_non_exhaustive()
    }
}

/// MIME type for a file name: `audio/mpeg`, `video/mp4` or `application/octet-stream`
pub fn content_type_for(name: &str) -> &'static str {
    match split_extension(name).1.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

impl MediaFetcher {
    /// Size and compatibility information about a stored artifact
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFileName`] for anything but a bare name, [`Error::NotFound`]
    /// if the artifact does not exist.
    pub async fn file_info(&self, name: &str) -> Result<FileInfo> {
        let name = validate_served_name(name)?;
        let stat = self.store.stat(name).await?;

        let extension = split_extension(name)
            .1
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let kind = if extension == ".mp4" {
            TargetFormat::Video
        } else {
            TargetFormat::Audio
        };
        let mb = size_mb(stat.size_bytes);
        let limit = self.pipeline.admission().size_limit_mb(kind);

        Ok(FileInfo {
            filename: name.to_string(),
            size_bytes: stat.size_bytes,
            size_mb: (mb * 100.0).round() / 100.0,
            extension,
            whatsapp_compatible: mb <= limit as f64,
        })
    }

    /// Open an artifact for streaming.
    ///
    /// With `storage.delete_after_serve` the artifact is removed from the store
    /// once the handle is open, so each artifact is served at most once: of two
    /// concurrent callers, the one whose removal fails gets [`Error::NotFound`].
    pub async fn open_for_download(&self, name: &str) -> Result<ServedArtifact> {
        let name = validate_served_name(name)?;
        let stat = self.store.stat(name).await?;
        let reader = self.store.open(name).await?;

        let mut removed = false;
        if self.config.storage.delete_after_serve {
            match self.store.delete(name).await {
                Ok(()) => removed = true,
                Err(e @ Error::NotFound(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(filename = %name, error = %e, "failed to remove served artifact");
                }
            }
        }

        tracing::info!(filename = %name, size_bytes = stat.size_bytes, removed, "serving artifact");
        self.emit_event(Event::ArtifactServed {
            filename: name.to_string(),
            removed,
        });

        Ok(ServedArtifact {
            filename: name.to_string(),
            size_bytes: stat.size_bytes,
            content_type: content_type_for(name),
            reader,
            removed,
        })
    }
}
