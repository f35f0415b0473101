//! Common test utilities for mediafetch integration tests

use async_trait::async_trait;
use mediafetch::{
    Config, Extractor, FsStore, MediaFetcher, SourceMetadata, TargetFormat, WorkingName,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// What the stub leaves in the output directory
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub enum Output {
    /// `<prefix>.<ext>` following the output template
    Templated(&'static str),
    /// `<prefix>.<ext>` plus a leftover `<prefix>.<ext>.part`
    WithPartial(&'static str),
    /// `<name>`, ignoring the output template
    Named(&'static str),
    /// Nothing at all
    Nothing,
}

/// Extractor that writes files into the real output directory
pub struct StubExtractor {
    pub title: String,
    pub duration_secs: Option<u64>,
    pub output: Output,
    pub size: usize,
}

#[allow(dead_code)]
impl StubExtractor {
    pub fn new(title: &str, output: Output) -> Self {
        Self {
            title: title.to_string(),
            duration_secs: Some(212),
            output,
            size: 4096,
        }
    }

    pub fn with_duration(mut self, duration_secs: Option<u64>) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn probe(&self, _url: &str) -> mediafetch::Result<SourceMetadata> {
        Ok(SourceMetadata {
            title: self.title.clone(),
            duration_secs: self.duration_secs,
        })
    }

    async fn fetch(
        &self,
        _url: &str,
        _format: TargetFormat,
        working: &WorkingName,
        output_dir: &Path,
    ) -> mediafetch::Result<()> {
        let data = vec![0x42u8; self.size];
        match &self.output {
            Output::Templated(ext) => {
                tokio::fs::write(output_dir.join(format!("{}.{}", working.prefix, ext)), &data)
                    .await?;
            }
            Output::WithPartial(ext) => {
                tokio::fs::write(output_dir.join(format!("{}.{}", working.prefix, ext)), &data)
                    .await?;
                tokio::fs::write(
                    output_dir.join(format!("{}.{}.part", working.prefix, ext)),
                    b"partial",
                )
                .await?;
            }
            Output::Named(name) => {
                tokio::fs::write(output_dir.join(name), &data).await?;
            }
            Output::Nothing => {}
        }
        Ok(())
    }

    fn possible_extensions(&self, format: TargetFormat) -> &'static [&'static str] {
        match format {
            TargetFormat::Audio => &["m4a", "webm", "mp3"],
            TargetFormat::Video => &["mp4", "webm", "mkv"],
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Fetcher over a fresh temporary directory
pub async fn fetcher_with(extractor: StubExtractor) -> (MediaFetcher, TempDir) {
    fetcher_with_config(Config::default(), extractor).await
}

#[allow(dead_code)]
pub async fn fetcher_with_config(
    mut config: Config,
    extractor: StubExtractor,
) -> (MediaFetcher, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    config.storage.download_dir = temp_dir.path().to_path_buf();

    let store = FsStore::new(temp_dir.path())
        .await
        .expect("Failed to open store");
    let fetcher = MediaFetcher::with_components(config, Arc::new(store), Arc::new(extractor));
    (fetcher, temp_dir)
}

/// Sorted file names in `dir`
#[allow(dead_code)]
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read dir")
        .map(|entry| {
            entry
                .expect("Failed to read entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
