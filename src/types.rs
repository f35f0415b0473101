//! Core types for mediafetch

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use utoipa::ToSchema;

/// Output format of an acquisition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// Audio-only, transcoded to MP3
    Audio,
    /// Resolution-bounded video, transcoded to MP4
    Video,
}

impl TargetFormat {
    /// Final file extension, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Audio => "mp3",
            TargetFormat::Video => "mp4",
        }
    }

    /// Tag used at the start of working names
    pub fn tag(&self) -> &'static str {
        match self {
            TargetFormat::Audio => "audio",
            TargetFormat::Video => "video",
        }
    }

    /// Parse the `option` form field (`mp3` or `mp4`)
    pub fn from_option(option: &str) -> Option<Self> {
        match option.trim().to_ascii_lowercase().as_str() {
            "mp3" => Some(TargetFormat::Audio),
            "mp4" => Some(TargetFormat::Video),
            _ => None,
        }
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

/// A single acquisition request. Created per call, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcquisitionRequest {
    /// Remote media locator
    pub source_url: String,
    /// Requested output format
    pub target_format: TargetFormat,
}

impl AcquisitionRequest {
    /// Create a new request
    pub fn new(source_url: impl Into<String>, target_format: TargetFormat) -> Self {
        Self {
            source_url: source_url.into(),
            target_format,
        }
    }
}

/// Metadata obtained from the extractor before the full download
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Source title (raw, unsanitized)
    pub title: String,
    /// Duration in seconds, if the source reports one
    pub duration_secs: Option<u64>,
}

/// Collision-resistant placeholder name used until the final name is known
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkingName {
    /// Format tag + timestamp + random token, e.g. `audio_1760000000000_9f3c...`
    pub prefix: String,
    /// Extension the final artifact must carry, without the leading dot
    pub target_extension: String,
}

impl WorkingName {
    /// Output template handed to the extractor, relative to the shared directory
    pub fn output_template(&self) -> String {
        format!("{}.%(ext)s", self.prefix)
    }
}

/// A materialized file in the shared store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Artifact {
    /// Full path of the file
    #[schema(value_type = String)]
    pub path: PathBuf,
    /// Size in bytes
    pub size_bytes: u64,
    /// Extension without the leading dot
    pub extension: String,
}

impl Artifact {
    /// File name component of the artifact path
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Ordered set of file names present in the shared directory at one instant
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    names: BTreeSet<String>,
}

impl DirectorySnapshot {
    /// Build a snapshot from a listing
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// Whether the snapshot contains `name`
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names present in `self` but not in `earlier`, in listing order
    pub fn created_since(&self, earlier: &DirectorySnapshot) -> Vec<String> {
        self.names.difference(&earlier.names).cloned().collect()
    }
}

impl FromIterator<String> for DirectorySnapshot {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Size and compatibility information about a stored artifact
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileInfo {
    /// Artifact file name
    pub filename: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Size in MB, rounded to two decimals
    pub size_mb: f64,
    /// Lower-cased extension including the leading dot (e.g. ".mp4"), empty if none
    pub extension: String,
    /// Whether the artifact is within the size limit for its kind
    pub whatsapp_compatible: bool,
}

/// Outcome of one retention sweep
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SweepReport {
    /// Files examined
    pub scanned: usize,
    /// Files deleted because they were older than the cutoff
    pub deleted: Vec<String>,
    /// Files that were due for deletion but could not be removed
    pub failed: Vec<String>,
}

/// Event emitted during the lifecycle of acquisitions and sweeps
///
/// Consumers subscribe via [`MediaFetcher::subscribe`](crate::MediaFetcher::subscribe)
/// or the `GET /events` SSE stream.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An acquisition passed URL validation and is starting
    AcquisitionStarted {
        /// Source URL
        url: String,
        /// Requested format
        format: TargetFormat,
        /// Working prefix assigned to this attempt
        prefix: String,
    },

    /// Metadata probe finished
    MetadataProbed {
        /// Working prefix of the attempt
        prefix: String,
        /// Source title
        title: String,
        /// Duration in seconds, if known
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_secs: Option<u64>,
    },

    /// Acquisition produced a finalized artifact
    AcquisitionComplete {
        /// Working prefix of the attempt
        prefix: String,
        /// Final artifact file name
        filename: String,
        /// Artifact size in bytes
        size_bytes: u64,
    },

    /// Acquisition failed
    AcquisitionFailed {
        /// Source URL
        url: String,
        /// Machine-readable error code
        code: String,
        /// Human-readable error message
        message: String,
    },

    /// An artifact was streamed to a client
    ArtifactServed {
        /// Artifact file name
        filename: String,
        /// Whether the artifact was removed from the store
        removed: bool,
    },

    /// A retention sweep finished
    SweepComplete {
        /// Files examined
        scanned: usize,
        /// Files deleted
        deleted: usize,
        /// Files that could not be deleted
        failed: usize,
    },

    /// Fetcher is shutting down
    Shutdown,
}

impl Event {
    /// Short name used as the SSE event type
    pub fn kind(&self) -> &'static str {
        match self {
            Event::AcquisitionStarted { .. } => "acquisition_started",
            Event::MetadataProbed { .. } => "metadata_probed",
            Event::AcquisitionComplete { .. } => "acquisition_complete",
            Event::AcquisitionFailed { .. } => "acquisition_failed",
            Event::ArtifactServed { .. } => "artifact_served",
            Event::SweepComplete { .. } => "sweep_complete",
            Event::Shutdown => "shutdown",
        }
    }
}
