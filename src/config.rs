//! Configuration types for mediafetch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Shared artifact directory settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Directory all artifacts are written to (default: "./downloads")
    #[serde(default = "default_download_dir")]
    #[schema(value_type = String)]
    pub download_dir: PathBuf,

    /// Minimum free space in bytes required before starting an acquisition (0 = disabled)
    #[serde(default)]
    pub min_free_space: u64,

    /// Remove an artifact from the store once it has been streamed (default: true)
    #[serde(default = "default_true")]
    pub delete_after_serve: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            min_free_space: 0,
            delete_after_serve: true,
        }
    }
}

/// Duration and size thresholds
///
/// The size limits mirror what common messaging platforms accept for
/// attachments, so a produced artifact can be forwarded as-is.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AdmissionConfig {
    /// Longest video accepted, checked against the metadata probe (default: 90 minutes)
    #[serde(default = "default_max_video_duration", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub max_video_duration: Duration,

    /// Largest MP4 artifact in MB (default: 16)
    #[serde(default = "default_max_video_size_mb")]
    pub max_video_size_mb: u64,

    /// Largest MP3 artifact in MB (default: 100)
    #[serde(default = "default_max_audio_size_mb")]
    pub max_audio_size_mb: u64,

    /// Reject video sources whose duration is unknown (default: true)
    #[serde(default = "default_true")]
    pub reject_unknown_video_duration: bool,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_video_duration: default_max_video_duration(),
            max_video_size_mb: default_max_video_size_mb(),
            max_audio_size_mb: default_max_audio_size_mb(),
            reject_unknown_video_duration: true,
        }
    }
}

/// Post-acquisition output discovery
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ResolverConfig {
    /// Extensions the transcoder emits as intermediates; renamed (not re-encoded)
    /// to the target extension when no file already carries it
    #[serde(default = "default_convertible_extensions")]
    pub convertible_extensions: Vec<String>,

    /// Suffixes of in-progress files that are never considered a result
    #[serde(default = "default_ignored_suffixes")]
    pub ignored_suffixes: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            convertible_extensions: default_convertible_extensions(),
            ignored_suffixes: default_ignored_suffixes(),
        }
    }
}

/// yt-dlp adapter settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Upper bound on a single fetch + transcode (default: 15 minutes)
    #[serde(default = "default_extractor_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,

    /// MP3 bitrate (default: "128k")
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Highest video resolution requested from the source (default: 720)
    #[serde(default = "default_max_video_height")]
    pub max_video_height: u32,

    /// Additional arguments passed verbatim to every yt-dlp invocation
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: true,
            timeout: default_extractor_timeout(),
            audio_bitrate: default_audio_bitrate(),
            max_video_height: default_max_video_height(),
            extra_args: Vec::new(),
        }
    }
}

/// Background reclamation of aged artifacts
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetentionConfig {
    /// Run the sweeper at all (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Time between sweeps (default: 30 minutes)
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub sweep_interval: Duration,

    /// Files whose last modification is older than this are deleted (default: 1 hour)
    #[serde(default = "default_max_age", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub max_age: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval: default_sweep_interval(),
            max_age: default_max_age(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:5000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for MediaFetcher
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Shared directory settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Duration and size thresholds
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Output discovery settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// yt-dlp adapter settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Retention sweeper settings
    #[serde(default)]
    pub retention: RetentionConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Download directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.storage.download_dir
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.retention.sweep_interval.is_zero() {
            return Err(Error::Config {
                message: "sweep interval must be greater than zero".to_string(),
                key: Some("retention.sweep_interval".to_string()),
            });
        }
        if self.extractor.timeout.is_zero() {
            return Err(Error::Config {
                message: "extractor timeout must be greater than zero".to_string(),
                key: Some("extractor.timeout".to_string()),
            });
        }
        if self.admission.max_video_size_mb == 0 || self.admission.max_audio_size_mb == 0 {
            return Err(Error::Config {
                message: "size limits must be greater than zero".to_string(),
                key: Some("admission".to_string()),
            });
        }
        Ok(())
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_true() -> bool {
    true
}

fn default_max_video_duration() -> Duration {
    Duration::from_secs(90 * 60)
}

fn default_max_video_size_mb() -> u64 {
    16
}

fn default_max_audio_size_mb() -> u64 {
    100
}

fn default_convertible_extensions() -> Vec<String> {
    vec![
        "webm".into(),
        "m4a".into(),
        "wav".into(),
        "mp4".into(),
        "mkv".into(),
        "opus".into(),
        "ogg".into(),
        "aac".into(),
        "mov".into(),
        "flac".into(),
    ]
}

fn default_ignored_suffixes() -> Vec<String> {
    vec![".part".into(), ".ytdl".into(), ".temp".into()]
}

fn default_extractor_timeout() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_audio_bitrate() -> String {
    "128k".to_string()
}

fn default_max_video_height() -> u32 {
    720
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_max_age() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
