//! Short-time Fourier transform spectrogram
//!
//! Converts a mono PCM signal into a time-frequency power matrix using
//! pure-Rust FFT libraries. Produced once per signal and immutable
//! thereafter; every downstream stage reads it, none mutate it.

use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::signal::Signal;

/// Time-frequency power matrix with its coordinate arrays.
///
/// `power` is indexed `[frequency bin][time frame]`; `frequencies` gives
/// the Hz value of each row and `times` the second value of each column.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    /// Frequency of each row, in Hz.
    pub frequencies: Vec<f32>,
    /// Center time of each column, in seconds.
    pub times: Vec<f32>,
    power: Vec<Vec<f32>>,
}

impl Spectrogram {
    /// The power matrix, `[frequency bin][time frame]`.
    pub fn power(&self) -> &[Vec<f32>] {
        &self.power
    }

    /// Number of frequency bins (rows).
    pub fn bins(&self) -> usize {
        self.power.len()
    }

    /// Number of time frames (columns).
    pub fn frames(&self) -> usize {
        self.power.first().map(Vec::len).unwrap_or(0)
    }

    /// Total cell count.
    pub fn cells(&self) -> usize {
        self.bins() * self.frames()
    }

    /// Whether the signal was too short to produce a single frame.
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }
}

/// Spectrogram builder with a pre-planned FFT and pre-computed window.
///
/// Reusable across signals; `build` is a pure function of the signal and
/// the configuration captured at construction.
pub struct SpectrogramBuilder {
    /// Real-to-complex FFT plan
    fft: Arc<dyn RealToComplex<f32>>,
    /// Pre-computed Hann window coefficients
    window: Vec<f32>,
    /// Window length in samples
    nperseg: usize,
    /// Hop between frames in samples
    hop: usize,
    /// Required input sample rate in Hz
    sample_rate: u32,
    /// Scratch buffer for FFT input
    scratch_input: Vec<f32>,
    /// Scratch buffer for FFT output
    scratch_output: Vec<Complex<f32>>,
}

impl SpectrogramBuilder {
    /// Create a builder for the given configuration.
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let nperseg = config.nperseg();
        let hop = config.hop();

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(nperseg);

        let window: Vec<f32> = apodize::hanning_iter(nperseg).map(|x| x as f32).collect();

        let scratch_input = vec![0.0f32; nperseg];
        let scratch_output = vec![Complex::new(0.0f32, 0.0f32); nperseg / 2 + 1];

        Ok(Self {
            fft,
            window,
            nperseg,
            hop,
            sample_rate: config.sample_rate,
            scratch_input,
            scratch_output,
        })
    }

    /// Number of frequency bins each frame produces.
    pub fn bins(&self) -> usize {
        self.nperseg / 2 + 1
    }

    /// Build the power spectrogram of a mono signal.
    ///
    /// Rejects signals whose sample rate differs from the configured rate.
    /// A signal shorter than one window yields an empty spectrogram, not
    /// an error.
    pub fn build(&mut self, signal: &Signal) -> EngineResult<Spectrogram> {
        if signal.sample_rate() != self.sample_rate {
            return Err(EngineError::sample_rate_mismatch(
                self.sample_rate,
                signal.sample_rate(),
            ));
        }

        let samples = signal.samples();
        let bins = self.bins();
        let frames = if samples.len() < self.nperseg {
            0
        } else {
            (samples.len() - self.nperseg) / self.hop + 1
        };

        let mut power: Vec<Vec<f32>> = (0..bins).map(|_| Vec::with_capacity(frames)).collect();

        for frame_idx in 0..frames {
            let start = frame_idx * self.hop;
            let frame = &samples[start..start + self.nperseg];

            for (slot, (&sample, &coef)) in self
                .scratch_input
                .iter_mut()
                .zip(frame.iter().zip(self.window.iter()))
            {
                *slot = sample as f32 * coef;
            }

            self.fft
                .process(&mut self.scratch_input, &mut self.scratch_output)
                .expect("FFT processing failed");

            for (bin, value) in self.scratch_output.iter().enumerate() {
                power[bin].push(value.re * value.re + value.im * value.im);
            }
        }

        let frequencies = (0..bins)
            .map(|bin| bin as f32 * self.sample_rate as f32 / self.nperseg as f32)
            .collect();
        let times = (0..frames)
            .map(|frame| (frame * self.hop + self.nperseg / 2) as f32 / self.sample_rate as f32)
            .collect();

        debug_assert!(power.iter().all(|row| row.len() == frames));

        Ok(Spectrogram {
            frequencies,
            times,
            power,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    fn sine_signal(frequency: f32, sample_rate: u32, num_samples: usize) -> Signal {
        let samples = (0..num_samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                ((2.0 * PI * frequency * t).sin() * 16000.0) as i16
            })
            .collect();
        Signal::mono(samples, sample_rate)
    }

    #[test]
    fn test_dimensions_match_coordinates() {
        let config = EngineConfig::default();
        let mut builder = SpectrogramBuilder::new(&config).unwrap();
        let signal = sine_signal(440.0, 44100, 44100);

        let spectrogram = builder.build(&signal).unwrap();
        assert_eq!(spectrogram.bins(), 442);
        assert_eq!(spectrogram.frequencies.len(), spectrogram.bins());
        assert_eq!(spectrogram.times.len(), spectrogram.frames());
        // (44100 - 882) / 441 + 1
        assert_eq!(spectrogram.frames(), 99);
    }

    #[test]
    fn test_rejects_wrong_sample_rate() {
        let config = EngineConfig::default();
        let mut builder = SpectrogramBuilder::new(&config).unwrap();
        let signal = sine_signal(440.0, 48000, 48000);

        let err = builder.build(&signal).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_short_signal_yields_empty_spectrogram() {
        let config = EngineConfig::default();
        let mut builder = SpectrogramBuilder::new(&config).unwrap();
        let signal = sine_signal(440.0, 44100, 100);

        let spectrogram = builder.build(&signal).unwrap();
        assert!(spectrogram.is_empty());
        assert_eq!(spectrogram.cells(), 0);
        assert!(spectrogram.times.is_empty());
    }

    #[test]
    fn test_energy_lands_in_expected_bin() {
        let config = EngineConfig::default();
        let mut builder = SpectrogramBuilder::new(&config).unwrap();
        // 1 kHz sine; bin width is 44100 / 882 = 50 Hz, so bin 20.
        let signal = sine_signal(1000.0, 44100, 44100);

        let spectrogram = builder.build(&signal).unwrap();
        let mid_frame = spectrogram.frames() / 2;
        let (loudest_bin, _) = spectrogram
            .power()
            .iter()
            .enumerate()
            .map(|(bin, row)| (bin, row[mid_frame]))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap();

        assert_eq!(loudest_bin, 20);
        assert!((spectrogram.frequencies[loudest_bin] - 1000.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_deterministic_across_builds() {
        let config = EngineConfig::default();
        let mut builder = SpectrogramBuilder::new(&config).unwrap();
        let signal = sine_signal(440.0, 44100, 22050);

        let first = builder.build(&signal).unwrap();
        let second = builder.build(&signal).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_silence_has_zero_power() {
        let config = EngineConfig::default();
        let mut builder = SpectrogramBuilder::new(&config).unwrap();
        let signal = Signal::mono(vec![0; 44100], 44100);

        let spectrogram = builder.build(&signal).unwrap();
        assert!(spectrogram
            .power()
            .iter()
            .all(|row| row.iter().all(|&p| p == 0.0)));
    }
}
