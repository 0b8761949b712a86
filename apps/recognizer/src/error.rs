//! Error handling for the recognizer app
//!
//! Decoding and filesystem failures are environmental and surface to the
//! user as "could not process this audio"; they are kept apart from the
//! matcher's "no match found", which is a successful outcome and never an
//! error.

use std::path::Path;

use thiserror::Error;
use waveprint_engine::EngineError;

/// Recognizer error type.
#[derive(Error, Debug)]
pub enum RecognizerError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Audio container could not be decoded to PCM
    #[error("audio decoding failed for '{path}': {reason}")]
    Decode { path: String, reason: String },

    /// File system access error
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    /// Failure inside the fingerprinting engine or its stores
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl RecognizerError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Engine(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Create a decoding error.
    pub fn decode(path: &Path, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for recognizer operations.
pub type RecognizerResult<T> = Result<T, RecognizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_delegates_to_engine() {
        let err = RecognizerError::Engine(EngineError::StoreUnavailable("down".into()));
        assert!(err.is_retryable());

        let err = RecognizerError::decode(Path::new("/music/x.mp3"), "truncated header");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_decode_display() {
        let err = RecognizerError::decode(Path::new("/music/x.mp3"), "truncated header");
        assert_eq!(
            err.to_string(),
            "audio decoding failed for '/music/x.mp3': truncated header"
        );
    }
}
