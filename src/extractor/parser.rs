//! Parsing of yt-dlp output

use crate::error::{Error, Result};
use crate::types::SourceMetadata;
use serde::Deserialize;

/// Most stderr lines carried into an error message
const MAX_STDERR_LINES: usize = 5;

#[derive(Debug, Deserialize)]
struct ProbeJson {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    is_live: Option<bool>,
}

/// Parse the `--dump-json` output of a probe into metadata.
///
/// A missing title becomes empty (naming falls back later). Live streams and
/// missing, negative or non-finite durations are reported as unknown.
pub fn parse_probe_output(stdout: &[u8]) -> Result<SourceMetadata> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with('{'))
        .ok_or_else(|| Error::AcquisitionFailed("extractor returned no metadata".to_string()))?;

    let probe: ProbeJson = serde_json::from_str(line)
        .map_err(|e| Error::AcquisitionFailed(format!("extractor returned invalid JSON: {}", e)))?;

    let duration_secs = match (probe.is_live, probe.duration) {
        (Some(true), _) => None,
        (_, Some(d)) if d.is_finite() && d >= 0.0 => Some(d.round() as u64),
        _ => None,
    };

    Ok(SourceMetadata {
        title: probe.title.unwrap_or_default(),
        duration_secs,
    })
}

/// Condense yt-dlp stderr into a short failure message.
///
/// `ERROR:` lines are preferred; otherwise the last few non-empty lines.
pub fn stderr_summary(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let errors: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| l.starts_with("ERROR"))
        .collect();
    let chosen = if errors.is_empty() { &lines } else { &errors };

    let start = chosen.len().saturating_sub(MAX_STDERR_LINES);
    let summary = chosen[start..].join("\n");
    if summary.is_empty() {
        "extractor exited without an error message".to_string()
    } else {
        summary
    }
}
