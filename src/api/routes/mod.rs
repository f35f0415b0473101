//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`downloads`] - Acquisition and artifact retrieval
//! - [`system`] - Health, version, events, OpenAPI

use serde::{Deserialize, Serialize};

mod downloads;
mod system;

pub use downloads::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Form body for POST /download
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadForm {
    /// Source URL
    pub url: Option<String>,
    /// Target format: "mp3" or "mp4"
    pub option: Option<String>,
}

/// Query parameters for GET /download_file and GET /file_info
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileQuery {
    /// Artifact file name as returned by POST /download
    pub file: Option<String>,
}

/// Response for a successful POST /download
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DownloadResponse {
    /// Always "success"
    pub status: String,
    /// Name to pass to GET /download_file
    pub filename: String,
    /// Artifact size in bytes
    pub size_bytes: u64,
}

/// Response for GET /file_info
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FileInfoResponse {
    /// Always "success"
    pub status: String,
    /// Artifact information
    #[serde(flatten)]
    pub info: crate::types::FileInfo,
}
