//! Media extraction backends
//!
//! The pipeline talks to extraction through the [`Extractor`] trait:
//!
//! - [`YtDlpExtractor`]: drives the external `yt-dlp` binary
//! - [`NoOpExtractor`]: fails every call, for running without yt-dlp
//!
//! ## Usage
//!
//! ```no_run
//! use mediafetch::config::ExtractorConfig;
//! use mediafetch::extractor::{Extractor, NoOpExtractor, YtDlpExtractor};
//! use std::sync::Arc;
//!
//! let config = ExtractorConfig::default();
//! let extractor: Arc<dyn Extractor> = match YtDlpExtractor::from_config(&config) {
//!     Some(ytdlp) => Arc::new(ytdlp),
//!     None => Arc::new(NoOpExtractor),
//! };
//! println!("using {}", extractor.name());
//! ```

mod noop;
mod parser;
mod traits;
mod ytdlp;

pub use noop::NoOpExtractor;
pub use parser::{parse_probe_output, stderr_summary};
pub use traits::Extractor;
pub use ytdlp::YtDlpExtractor;
