//! Engine and matcher configuration
//!
//! All pipeline stages are pure functions of their input and these
//! parameters; identical input and configuration always produce identical
//! fingerprints.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Sample rate the pipeline is calibrated for, in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// STFT window length as a fraction of a second (20 ms = 882 samples
/// at 44.1 kHz).
pub const DEFAULT_FFT_WINDOW_SIZE: f32 = 0.02;

/// Edge length of the square neighborhood used by the peak max-filter.
pub const DEFAULT_PEAK_BOX_SIZE: usize = 20;

/// Fraction of local maxima retained after ranking.
pub const DEFAULT_POINT_EFFICIENCY: f32 = 0.1;

/// Fingerprinting pipeline parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Required input sample rate in Hz. Signals at any other rate are
    /// rejected, not resampled.
    pub sample_rate: u32,

    /// STFT window length in seconds.
    pub fft_window_size: f32,

    /// Fraction of the window shared between consecutive frames.
    pub window_overlap: f32,

    /// Edge length of the square peak-search neighborhood, in cells.
    pub peak_box_size: usize,

    /// Density control: fraction of local maxima kept after ranking by
    /// power. Lower values trade recall for throughput and index size.
    pub point_efficiency: f32,

    /// Cells at or below this power are never peaks. The default of zero
    /// excludes exact silence while keeping everything else.
    pub min_peak_power: f32,

    /// Start of the target zone, seconds after the anchor. Must be
    /// positive so an anchor can never pair with itself.
    pub target_start: f32,

    /// Length of the target zone along the time axis, in seconds.
    pub target_width: f32,

    /// Total height of the target zone along the frequency axis, in Hz,
    /// centered on the anchor.
    pub target_height: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            fft_window_size: DEFAULT_FFT_WINDOW_SIZE,
            window_overlap: 0.5,
            peak_box_size: DEFAULT_PEAK_BOX_SIZE,
            point_efficiency: DEFAULT_POINT_EFFICIENCY,
            min_peak_power: 0.0,
            target_start: 0.05,
            target_width: 1.0,
            target_height: 1500.0,
        }
    }
}

impl EngineConfig {
    /// STFT window length in samples.
    pub fn nperseg(&self) -> usize {
        (self.sample_rate as f32 * self.fft_window_size) as usize
    }

    /// Hop between consecutive STFT frames, in samples.
    pub fn hop(&self) -> usize {
        let nperseg = self.nperseg();
        let hop = nperseg - (nperseg as f32 * self.window_overlap) as usize;
        hop.max(1)
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> EngineResult<()> {
        if self.sample_rate == 0 {
            return Err(EngineError::InvalidConfig(
                "sample_rate must be non-zero".into(),
            ));
        }
        if self.nperseg() < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "fft_window_size {} yields a window under 2 samples",
                self.fft_window_size
            )));
        }
        if !(0.0..1.0).contains(&self.window_overlap) {
            return Err(EngineError::InvalidConfig(format!(
                "window_overlap {} must be in [0, 1)",
                self.window_overlap
            )));
        }
        if self.peak_box_size == 0 {
            return Err(EngineError::InvalidConfig(
                "peak_box_size must be non-zero".into(),
            ));
        }
        if !(self.point_efficiency > 0.0 && self.point_efficiency <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "point_efficiency {} must be in (0, 1]",
                self.point_efficiency
            )));
        }
        // target_start > 0 excludes self-pairing by construction.
        if self.target_start <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "target_start {} must be positive",
                self.target_start
            )));
        }
        if self.target_width <= 0.0 || self.target_height <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "target zone dimensions must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Matching policy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Minimum votes in the winning offset-delta bucket below which the
    /// decision is "no match".
    pub min_votes: u32,

    /// Bucket width for the offset-delta histogram, in seconds. Offsets
    /// are hop-quantized by construction, so the default matches the
    /// default hop (10 ms).
    pub offset_resolution: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_votes: 10,
            offset_resolution: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_parameters() {
        let config = EngineConfig::default();
        assert_eq!(config.nperseg(), 882);
        assert_eq!(config.hop(), 441);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_sample_rate() {
        let config = EngineConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_target_start() {
        let config = EngineConfig {
            target_start: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(crate::error::EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_efficiency() {
        for efficiency in [0.0, -0.5, 1.5] {
            let config = EngineConfig {
                point_efficiency: efficiency,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "efficiency {efficiency}");
        }
    }

    #[test]
    fn test_hop_never_zero() {
        let config = EngineConfig {
            window_overlap: 0.999,
            ..Default::default()
        };
        assert!(config.hop() >= 1);
    }
}
