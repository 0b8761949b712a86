//! Spectrogram peak extraction
//!
//! Finds cells that are the maximum of their square neighborhood, ranks
//! them by power and keeps a density-capped prefix. The cap,
//! `floor(cells / box² * efficiency)`, deliberately yields fewer peaks for
//! denser spectrograms or larger boxes, trading recall for throughput and
//! index size.

use crate::config::EngineConfig;
use crate::spectrogram::Spectrogram;

/// A locally-maximal spectrogram cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peak {
    /// Row index into the spectrogram's frequency axis.
    pub freq_bin: usize,
    /// Column index into the spectrogram's time axis.
    pub frame: usize,
}

/// Extract peaks, ordered by descending power.
///
/// A cell qualifies when it equals the maximum of its `box × box`
/// neighborhood and its power exceeds the configured floor. Ties in power
/// are broken by position (frequency bin, then frame) so the ranking is
/// total and reproducible.
pub fn extract(spectrogram: &Spectrogram, config: &EngineConfig) -> Vec<Peak> {
    if spectrogram.is_empty() {
        return Vec::new();
    }

    let power = spectrogram.power();
    let bins = spectrogram.bins();
    let frames = spectrogram.frames();
    let box_size = config.peak_box_size;

    // The neighborhood of cell i spans [i - box/2, i + (box-1)/2], clamped
    // at the boundaries. Clamping is equivalent to zero padding because
    // power values are non-negative.
    let reach_lo = box_size / 2;
    let reach_hi = box_size - box_size / 2 - 1;

    // Separable max filter: slide along time per row, then along
    // frequency per column of the intermediate matrix.
    let row_max: Vec<Vec<f32>> = power
        .iter()
        .map(|row| sliding_max(row, reach_lo, reach_hi))
        .collect();

    let mut candidates: Vec<(f32, usize, usize)> = Vec::new();
    let mut column = vec![0.0f32; bins];
    for frame in 0..frames {
        for bin in 0..bins {
            column[bin] = row_max[bin][frame];
        }
        let column_max = sliding_max(&column, reach_lo, reach_hi);
        for bin in 0..bins {
            let value = power[bin][frame];
            if value > config.min_peak_power && value == column_max[bin] {
                candidates.push((value, bin, frame));
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });

    let cap = peak_cap(spectrogram.cells(), box_size, config.point_efficiency);
    candidates.truncate(cap);

    tracing::debug!(
        candidates = candidates.len(),
        cap,
        "extracted spectrogram peaks"
    );

    candidates
        .into_iter()
        .map(|(_, freq_bin, frame)| Peak { freq_bin, frame })
        .collect()
}

/// Maximum retained peak count for a spectrogram of `cells` cells.
pub fn peak_cap(cells: usize, box_size: usize, efficiency: f32) -> usize {
    ((cells as f64 / (box_size * box_size) as f64) * efficiency as f64).floor() as usize
}

/// Sliding-window maximum over `[i - reach_lo, i + reach_hi]`, clamped.
fn sliding_max(values: &[f32], reach_lo: usize, reach_hi: usize) -> Vec<f32> {
    let n = values.len();
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(reach_lo);
            let end = (i + reach_hi).min(n - 1);
            values[start..=end]
                .iter()
                .copied()
                .fold(f32::NEG_INFINITY, f32::max)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;
    use crate::signal::Signal;
    use crate::spectrogram::SpectrogramBuilder;

    fn sweep_signal(duration_secs: f32, sample_rate: u32) -> Signal {
        // Linear chirp from 200 Hz to 2 kHz with a gentle fade-in so peak
        // powers are distinct and the ranking is stable.
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let samples = (0..num_samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                let freq = 200.0 + (2000.0 - 200.0) * t / duration_secs;
                let amplitude = 8000.0 + 8000.0 * t / duration_secs;
                ((2.0 * PI * freq * t).sin() * amplitude) as i16
            })
            .collect();
        Signal::mono(samples, sample_rate)
    }

    #[test]
    fn test_cap_formula() {
        assert_eq!(peak_cap(220_000, 20, 0.1), 55);
        assert_eq!(peak_cap(0, 20, 0.1), 0);
        assert_eq!(peak_cap(399, 20, 1.0), 0);
    }

    #[test]
    fn test_sliding_max_clamps_at_boundaries() {
        let values = [1.0, 5.0, 2.0, 0.0, 3.0];
        assert_eq!(
            sliding_max(&values, 1, 1),
            vec![5.0, 5.0, 5.0, 3.0, 3.0]
        );
    }

    #[test]
    fn test_cap_respected() {
        let config = EngineConfig::default();
        let mut builder = SpectrogramBuilder::new(&config).unwrap();
        let spectrogram = builder.build(&sweep_signal(3.0, 44100)).unwrap();

        let peaks = extract(&spectrogram, &config);
        let cap = peak_cap(
            spectrogram.cells(),
            config.peak_box_size,
            config.point_efficiency,
        );
        assert!(!peaks.is_empty());
        assert!(peaks.len() <= cap);
    }

    #[test]
    fn test_peaks_are_local_maxima() {
        let config = EngineConfig::default();
        let mut builder = SpectrogramBuilder::new(&config).unwrap();
        let spectrogram = builder.build(&sweep_signal(2.0, 44100)).unwrap();

        let power = spectrogram.power();
        for peak in extract(&spectrogram, &config) {
            let value = power[peak.freq_bin][peak.frame];
            let lo = config.peak_box_size / 2;
            let hi = config.peak_box_size - lo - 1;
            let bin_start = peak.freq_bin.saturating_sub(lo);
            let bin_end = (peak.freq_bin + hi).min(spectrogram.bins() - 1);
            let frame_start = peak.frame.saturating_sub(lo);
            let frame_end = (peak.frame + hi).min(spectrogram.frames() - 1);
            for bin in bin_start..=bin_end {
                for frame in frame_start..=frame_end {
                    assert!(
                        power[bin][frame] <= value,
                        "cell ({bin}, {frame}) exceeds peak ({}, {})",
                        peak.freq_bin,
                        peak.frame
                    );
                }
            }
        }
    }

    #[test]
    fn test_ordered_by_descending_power() {
        let config = EngineConfig::default();
        let mut builder = SpectrogramBuilder::new(&config).unwrap();
        let spectrogram = builder.build(&sweep_signal(2.0, 44100)).unwrap();

        let peaks = extract(&spectrogram, &config);
        let powers: Vec<f32> = peaks
            .iter()
            .map(|p| spectrogram.power()[p.freq_bin][p.frame])
            .collect();
        assert!(powers.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_silence_yields_no_peaks() {
        let config = EngineConfig::default();
        let mut builder = SpectrogramBuilder::new(&config).unwrap();
        let spectrogram = builder
            .build(&Signal::mono(vec![0; 88200], 44100))
            .unwrap();

        assert!(extract(&spectrogram, &config).is_empty());
    }

    #[test]
    fn test_empty_spectrogram_yields_no_peaks() {
        let config = EngineConfig::default();
        let mut builder = SpectrogramBuilder::new(&config).unwrap();
        let spectrogram = builder.build(&Signal::mono(vec![], 44100)).unwrap();

        assert!(extract(&spectrogram, &config).is_empty());
    }
}
