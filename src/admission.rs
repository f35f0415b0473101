//! Duration and size admission control
//!
//! The duration half runs against the metadata probe, before anything is
//! downloaded. The size half runs against the resolved artifact.

use crate::config::AdmissionConfig;
use crate::error::Error;
use crate::types::TargetFormat;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Why a request or artifact was not admitted
#[derive(Clone, Debug, PartialEq)]
pub enum RejectReason {
    /// Source is longer than the limit for its format
    DurationExceeded {
        /// Probed duration
        duration_secs: u64,
        /// Configured limit
        limit_secs: u64,
    },
    /// Duration is unknown and the format requires a bounded one
    DurationUnknown,
    /// Artifact is larger than the limit for its format
    SizeExceeded {
        /// Measured size in bytes
        size_bytes: u64,
        /// Measured size in MB
        size_mb: f64,
        /// Configured limit in MB
        limit_mb: u64,
    },
}

impl RejectReason {
    /// Convert into the pipeline error for `format`
    pub fn into_error(self, format: TargetFormat) -> Error {
        match self {
            RejectReason::DurationExceeded {
                duration_secs,
                limit_secs,
            } => Error::DurationExceeded {
                duration_secs,
                limit_secs,
            },
            RejectReason::DurationUnknown => Error::DurationUnknown { format },
            RejectReason::SizeExceeded {
                size_bytes,
                size_mb,
                limit_mb,
            } => Error::SizeExceeded {
                format,
                size_bytes,
                size_mb,
                limit_mb,
            },
        }
    }
}

/// Admission decision
#[derive(Clone, Debug, PartialEq)]
pub enum Admission {
    /// Within limits
    Allowed,
    /// Outside limits
    Rejected(RejectReason),
}

impl Admission {
    /// Whether the decision is [`Admission::Allowed`]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }

    /// `Ok(())` when allowed, the matching pipeline error otherwise
    pub fn into_result(self, format: TargetFormat) -> crate::Result<()> {
        match self {
            Admission::Allowed => Ok(()),
            Admission::Rejected(reason) => Err(reason.into_error(format)),
        }
    }
}

/// Size in MB as used by every limit in this module
pub fn size_mb(size_bytes: u64) -> f64 {
    size_bytes as f64 / BYTES_PER_MB
}

/// Fixed platform thresholds applied to every acquisition
#[derive(Clone, Debug)]
pub struct AdmissionPolicy {
    config: AdmissionConfig,
}

impl AdmissionPolicy {
    /// Create a policy from configuration
    pub fn new(config: AdmissionConfig) -> Self {
        Self { config }
    }

    /// Size limit in MB for `format`
    pub fn size_limit_mb(&self, format: TargetFormat) -> u64 {
        match format {
            TargetFormat::Audio => self.config.max_audio_size_mb,
            TargetFormat::Video => self.config.max_video_size_mb,
        }
    }

    /// Duration half of the policy. Only video is bounded; audio of any or
    /// unknown length passes.
    pub fn check_duration(&self, format: TargetFormat, duration_secs: Option<u64>) -> Admission {
        if format == TargetFormat::Audio {
            return Admission::Allowed;
        }

        let limit_secs = self.config.max_video_duration.as_secs();
        match duration_secs {
            Some(duration_secs) if duration_secs > limit_secs => {
                Admission::Rejected(RejectReason::DurationExceeded {
                    duration_secs,
                    limit_secs,
                })
            }
            Some(_) => Admission::Allowed,
            None if self.config.reject_unknown_video_duration => {
                Admission::Rejected(RejectReason::DurationUnknown)
            }
            None => Admission::Allowed,
        }
    }

    /// Size half of the policy
    pub fn check_size(&self, format: TargetFormat, size_bytes: u64) -> Admission {
        let limit_mb = self.size_limit_mb(format);
        let measured = size_mb(size_bytes);

        if measured > limit_mb as f64 {
            Admission::Rejected(RejectReason::SizeExceeded {
                size_bytes,
                size_mb: measured,
                limit_mb,
            })
        } else {
            Admission::Allowed
        }
    }

    /// Both halves; the duration check wins when both fail.
    pub fn check(
        &self,
        format: TargetFormat,
        duration_secs: Option<u64>,
        size_bytes: u64,
    ) -> Admission {
        match self.check_duration(format, duration_secs) {
            Admission::Allowed => self.check_size(format, size_bytes),
            rejected => rejected,
        }
    }
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::new(AdmissionConfig::default())
    }
}
