//! Recognizer configuration loaded from environment variables
//!
//! Configuration is loaded from environment variables with sensible
//! defaults for development. Engine parameters that are safe to tune from
//! the outside (vote floor, peak density) get their own variables; the
//! rest stay at the engine's calibrated defaults.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use waveprint_engine::{EngineConfig, MatcherConfig};

/// Recognizer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for recordings to register.
    pub library_path: PathBuf,

    /// Minimum votes required to report a match.
    pub min_votes: u32,

    /// Fraction of spectrogram local maxima retained as peaks.
    pub point_efficiency: f32,

    /// Optional path to dump the query's hash records as JSON.
    pub export_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let engine_defaults = EngineConfig::default();
        let matcher_defaults = MatcherConfig::default();

        Ok(Self {
            library_path: env::var("WAVEPRINT_LIBRARY_PATH")
                .unwrap_or_else(|_| "./library".to_string())
                .into(),

            min_votes: env::var("WAVEPRINT_MIN_VOTES")
                .unwrap_or_else(|_| matcher_defaults.min_votes.to_string())
                .parse()
                .context("Invalid WAVEPRINT_MIN_VOTES value")?,

            point_efficiency: env::var("WAVEPRINT_POINT_EFFICIENCY")
                .unwrap_or_else(|_| engine_defaults.point_efficiency.to_string())
                .parse()
                .context("Invalid WAVEPRINT_POINT_EFFICIENCY value")?,

            export_path: env::var("WAVEPRINT_EXPORT_FINGERPRINTS")
                .ok()
                .map(PathBuf::from),
        })
    }

    /// Engine configuration with the tunable overrides applied.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            point_efficiency: self.point_efficiency,
            ..Default::default()
        }
    }

    /// Matcher configuration with the tunable overrides applied.
    pub fn matcher(&self) -> MatcherConfig {
        MatcherConfig {
            min_votes: self.min_votes,
            ..Default::default()
        }
    }
}
