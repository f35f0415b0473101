//! Error types for mediafetch
//!
//! This module provides the error taxonomy of the acquisition pipeline and the
//! service boundary, including:
//! - Pipeline errors (invalid source, admission violations, unresolved output)
//! - HTTP status code mapping for API integration
//! - The JSON error envelope returned by every API endpoint

use crate::types::TargetFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for mediafetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mediafetch
///
/// Every pipeline-level error is terminal for the call that produced it.
/// Nothing in the crate retries automatically.
#[derive(Debug, Error)]
pub enum Error {
    /// Source URL does not match any accepted shape (rejected before any I/O)
    #[error("invalid source URL: {0}")]
    InvalidSource(String),

    /// Requested output format is not one of the supported targets
    #[error("invalid option: {0}")]
    InvalidFormat(String),

    /// Source is longer than the admission limit for its target format
    #[error("media is too long ({duration_secs}s); limit is {limit_secs}s")]
    DurationExceeded {
        /// Duration reported by the metadata probe
        duration_secs: u64,
        /// Configured maximum duration
        limit_secs: u64,
    },

    /// Duration could not be determined for a format that requires a bounded duration
    #[error("media duration is unknown; {format} downloads require a known duration")]
    DurationUnknown {
        /// Target format of the rejected request
        format: TargetFormat,
    },

    /// Produced artifact is larger than the admission limit for its format
    #[error("file too large ({size_mb:.1}MB); limit is {limit_mb}MB for {format}")]
    SizeExceeded {
        /// Target format of the rejected artifact
        format: TargetFormat,
        /// Measured size in bytes
        size_bytes: u64,
        /// Measured size in MB
        size_mb: f64,
        /// Configured limit in MB
        limit_mb: u64,
    },

    /// The extractor run produced no new files in the shared directory
    #[error("no new files were produced by the extractor")]
    NoNewFiles,

    /// New files appeared but none could be identified as the result
    #[error("could not identify output among new files: {}", new_files.join(", "))]
    UnresolvedOutput {
        /// Files created by the attempt, for diagnostics
        new_files: Vec<String>,
    },

    /// Opaque passthrough of an extractor failure (network, no stream, restriction)
    #[error("acquisition failed: {0}")]
    AcquisitionFailed(String),

    /// Requested artifact does not exist (already served or reclaimed)
    #[error("{0} not found")]
    NotFound(String),

    /// Requested artifact name is not a bare file name
    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    /// Insufficient disk space to start an acquisition
    #[error("insufficient disk space: need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        /// Number of bytes required
        required: u64,
        /// Number of bytes currently available on disk
        available: u64,
    },

    /// Failed to check disk space
    #[error("failed to check disk space: {0}")]
    DiskSpaceCheckFailed(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new acquisitions
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,
}

/// API error response format
///
/// Returned by every endpoint when an error occurs. `status` is always
/// `"error"` and `message` is suitable for displaying to end users.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "status": "error",
///   "message": "file too large (20.3MB); limit is 16MB for MP4",
///   "code": "size_exceeded",
///   "details": { "size_bytes": 21286092, "limit_mb": 16 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Always "error"
    pub status: String,

    /// Human-readable error message
    pub message: String,

    /// Machine-readable error code (e.g., "not_found", "duration_exceeded")
    pub code: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::InvalidSource(_) => 400,
            Error::InvalidFormat(_) => 400,
            Error::InvalidFileName(_) => 400,
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 422 Unprocessable Entity - Admission policy violations
            Error::DurationExceeded { .. } => 422,
            Error::DurationUnknown { .. } => 422,
            Error::SizeExceeded { .. } => 422,
            Error::InsufficientSpace { .. } => 507,

            // 500 Internal Server Error - Server-side issues
            Error::NoNewFiles => 500,
            Error::UnresolvedOutput { .. } => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::DiskSpaceCheckFailed(_) => 500,

            // 502 Bad Gateway - Upstream extractor errors
            Error::AcquisitionFailed(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::InvalidSource(_) => "invalid_source",
            Error::InvalidFormat(_) => "invalid_format",
            Error::DurationExceeded { .. } => "duration_exceeded",
            Error::DurationUnknown { .. } => "duration_unknown",
            Error::SizeExceeded { .. } => "size_exceeded",
            Error::NoNewFiles => "no_new_files",
            Error::UnresolvedOutput { .. } => "unresolved_output",
            Error::AcquisitionFailed(_) => "acquisition_failed",
            Error::NotFound(_) => "not_found",
            Error::InvalidFileName(_) => "invalid_file_name",
            Error::InsufficientSpace { .. } => "insufficient_space",
            Error::DiskSpaceCheckFailed(_) => "disk_space_check_failed",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::DurationExceeded {
                duration_secs,
                limit_secs,
            } => Some(serde_json::json!({
                "duration_secs": duration_secs,
                "limit_secs": limit_secs,
            })),
            Error::DurationUnknown { format } => Some(serde_json::json!({
                "format": format,
            })),
            Error::SizeExceeded {
                format,
                size_bytes,
                limit_mb,
                ..
            } => Some(serde_json::json!({
                "format": format,
                "size_bytes": size_bytes,
                "limit_mb": limit_mb,
            })),
            Error::UnresolvedOutput { new_files } => Some(serde_json::json!({
                "new_files": new_files,
            })),
            Error::InsufficientSpace {
                required,
                available,
            } => Some(serde_json::json!({
                "required_bytes": required,
                "available_bytes": available,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        match details {
            Some(details) => ApiError::with_details(code, message, details),
            None => ApiError::new(code, message),
        }
    }
}
