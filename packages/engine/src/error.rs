//! Error handling for the fingerprinting engine
//!
//! Environmental failures (bad input audio, store downtime) are returned
//! as typed results. Empty fingerprints and "no match" are successful
//! values, not errors. Internal shape violations between pipeline stages
//! are programming errors and fail fast via assertions instead of showing
//! up here.

use thiserror::Error;

/// Engine error type.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Input audio does not satisfy the pipeline's format contract
    /// (wrong sample rate or channel count). The caller must re-encode
    /// upstream; the engine never resamples.
    #[error("unsupported audio format: expected {expected}, got {actual}")]
    UnsupportedFormat { expected: String, actual: String },

    /// Engine configuration failed validation.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Fingerprint store insert or lookup failed (connectivity,
    /// throttling). Retry policy belongs to the store adapter or the
    /// caller, never the engine.
    #[error("fingerprint store unavailable: {0}")]
    StoreUnavailable(String),

    /// Blob store operation failed.
    #[error("blob store unavailable: {0}")]
    BlobUnavailable(String),
}

impl EngineError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::BlobUnavailable(_)
        )
    }

    /// Create an unsupported-format error for a sample rate mismatch.
    pub fn sample_rate_mismatch(expected: u32, actual: u32) -> Self {
        Self::UnsupportedFormat {
            expected: format!("{expected} Hz"),
            actual: format!("{actual} Hz"),
        }
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
