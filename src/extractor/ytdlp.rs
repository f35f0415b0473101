//! Extractor backed by the external yt-dlp binary

use super::parser::{parse_probe_output, stderr_summary};
use super::traits::Extractor;
use crate::config::ExtractorConfig;
use crate::error::Error;
use crate::types::{SourceMetadata, TargetFormat, WorkingName};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio[ext=webm]/bestaudio/best";

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "webm", "opus", "ogg", "wav", "aac"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "mov", "3gp", "flv"];

/// Extractor driving the `yt-dlp` command line tool
///
/// Audio is extracted to MP3; video is capped at the configured height and
/// re-encoded to H.264/AAC MP4. Processes are killed if the calling future is
/// dropped, so a pipeline timeout does not leak a running download.
///
/// # Examples
///
/// ```no_run
/// use mediafetch::config::ExtractorConfig;
/// use mediafetch::extractor::YtDlpExtractor;
/// use std::path::PathBuf;
///
/// // Explicit binary
/// let extractor = YtDlpExtractor::new(
///     PathBuf::from("/usr/local/bin/yt-dlp"),
///     &ExtractorConfig::default(),
/// );
///
/// // Or auto-discover from PATH
/// let extractor = YtDlpExtractor::from_path(&ExtractorConfig::default())
///     .expect("yt-dlp not found in PATH");
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary_path: PathBuf,
    audio_bitrate: String,
    max_video_height: u32,
    extra_args: Vec<String>,
}

impl YtDlpExtractor {
    /// Create an extractor with an explicit binary path
    pub fn new(binary_path: PathBuf, config: &ExtractorConfig) -> Self {
        Self {
            binary_path,
            audio_bitrate: config.audio_bitrate.clone(),
            max_video_height: config.max_video_height,
            extra_args: config.extra_args.clone(),
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path(config: &ExtractorConfig) -> Option<Self> {
        which::which("yt-dlp")
            .ok()
            .map(|path| Self::new(path, config))
    }

    /// Use the configured binary, falling back to a PATH search when enabled
    pub fn from_config(config: &ExtractorConfig) -> Option<Self> {
        match &config.ytdlp_path {
            Some(path) => Some(Self::new(path.clone(), config)),
            None if config.search_path => Self::from_path(config),
            None => None,
        }
    }

    /// Path of the binary this extractor runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn probe_args(&self, url: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--dump-json",
            "--no-playlist",
            "--skip-download",
            "--no-warnings",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push("--".into());
        args.push(url.into());
        args
    }

    fn fetch_args(
        &self,
        url: &str,
        format: TargetFormat,
        working: &WorkingName,
        output_dir: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let mut push = |a: &str| args.push(OsString::from(a));

        push("--no-playlist");
        push("--no-progress");
        push("--quiet");
        push("--no-warnings");
        push("--embed-metadata");
        // retention ages artifacts by mtime; keep the download time, not Last-Modified
        push("--no-mtime");

        match format {
            TargetFormat::Audio => {
                push("--format");
                push(AUDIO_FORMAT);
                push("--extract-audio");
                push("--audio-format");
                push("mp3");
                push("--audio-quality");
                push(&self.audio_bitrate);
                push("--postprocessor-args");
                push(&format!("ffmpeg:-ar 44100 -ac 2 -b:a {}", self.audio_bitrate));
            }
            TargetFormat::Video => {
                let h = self.max_video_height;
                push("--format");
                push(&format!(
                    "best[height<={h}][ext=mp4]/best[height<={h}]/best[ext=mp4]/best"
                ));
                push("--merge-output-format");
                push("mp4");
                push("--remux-video");
                push("mp4");
                push("--postprocessor-args");
                push(
                    "ffmpeg:-c:v libx264 -preset medium -crf 23 -c:a aac -b:a 128k \
                     -movflags +faststart -pix_fmt yuv420p -maxrate 1000k -bufsize 2000k",
                );
            }
        }

        for extra in &self.extra_args {
            push(extra);
        }

        args.push("--output".into());
        args.push(output_dir.join(working.output_template()).into_os_string());
        args.push("--".into());
        args.push(url.into());
        args
    }

    async fn run(&self, args: Vec<OsString>) -> crate::Result<std::process::Output> {
        let output = Command::new(&self.binary_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::AcquisitionFailed(format!("failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            return Err(Error::AcquisitionFailed(stderr_summary(&output.stderr)));
        }
        Ok(output)
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn probe(&self, url: &str) -> crate::Result<SourceMetadata> {
        tracing::debug!(url = %url, "probing metadata with yt-dlp");
        let output = self.run(self.probe_args(url)).await?;
        parse_probe_output(&output.stdout)
    }

    async fn fetch(
        &self,
        url: &str,
        format: TargetFormat,
        working: &WorkingName,
        output_dir: &Path,
    ) -> crate::Result<()> {
        tracing::debug!(url = %url, format = %format, prefix = %working.prefix, "fetching with yt-dlp");
        self.run(self.fetch_args(url, format, working, output_dir))
            .await
            .map(|_| ())
    }

    fn possible_extensions(&self, format: TargetFormat) -> &'static [&'static str] {
        match format {
            TargetFormat::Audio => AUDIO_EXTENSIONS,
            TargetFormat::Video => VIDEO_EXTENSIONS,
        }
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
