//! Anchor/target pairing and hash construction
//!
//! Each peak acts as an anchor and is paired with every peak inside its
//! target zone, a rectangle in (time, frequency) space ahead of the
//! anchor. A pair hashes the two frequencies and the time *delta* between
//! them, never the absolute anchor time, so a clip matches a stored
//! recording at any time offset. The anchor's absolute time travels
//! alongside the hash as the offset used for coherence checks during
//! matching.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::peaks::Peak;
use crate::spectrogram::Spectrogram;

/// Bits reserved for each quantized frequency (Hz). 2^20 Hz comfortably
/// covers the Nyquist frequency of any supported rate.
const FREQ_BITS: u64 = 20;

/// Bits reserved for the quantized time delta (ms). 2^20 ms is ~17.5
/// minutes, far beyond any sane target zone.
const DELTA_BITS: u64 = 20;

const FREQ_MASK: u64 = (1 << FREQ_BITS) - 1;
const DELTA_MASK: u64 = (1 << DELTA_BITS) - 1;

/// A peak translated into real units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatePoint {
    /// Frequency in Hz.
    pub frequency: f32,
    /// Time in seconds.
    pub time: f32,
}

/// One fingerprint hash with the absolute time of its anchor.
///
/// The songID is carried separately by the store write, so every record
/// of one fingerprinting call is attributable to exactly one song.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HashRecord {
    /// Deterministic hash of (anchor frequency, target frequency, Δt).
    pub hash: u64,
    /// Absolute anchor time in seconds.
    pub offset: f32,
}

/// Translate peak indices into (Hz, seconds) coordinates.
pub fn coordinates(peaks: &[Peak], spectrogram: &Spectrogram) -> Vec<CoordinatePoint> {
    peaks
        .iter()
        .map(|peak| CoordinatePoint {
            frequency: spectrogram.frequencies[peak.freq_bin],
            time: spectrogram.times[peak.frame],
        })
        .collect()
}

/// Pair every anchor with the points inside its target zone.
///
/// The zone spans `[anchor.time + target_start, anchor.time + target_start
/// + target_width]` in time and `anchor.frequency ± target_height / 2` in
/// frequency. `target_start` is validated positive, so a point can never
/// pair with itself. Too few points simply produce an empty list; callers
/// treat that as "cannot identify", not as corruption.
pub fn pair(points: &[CoordinatePoint], config: &EngineConfig) -> Vec<HashRecord> {
    let mut sorted: Vec<CoordinatePoint> = points.to_vec();
    sorted.sort_by(|a, b| {
        a.time
            .total_cmp(&b.time)
            .then_with(|| a.frequency.total_cmp(&b.frequency))
    });

    let half_height = config.target_height / 2.0;
    let mut records = Vec::new();

    for (i, anchor) in sorted.iter().enumerate() {
        let zone_start = anchor.time + config.target_start;
        let zone_end = zone_start + config.target_width;

        for target in &sorted[i + 1..] {
            if target.time < zone_start {
                continue;
            }
            if target.time > zone_end {
                break;
            }
            if (target.frequency - anchor.frequency).abs() > half_height {
                continue;
            }
            records.push(HashRecord {
                hash: pack_hash(anchor.frequency, target.frequency, target.time - anchor.time),
                offset: anchor.time,
            });
        }
    }

    tracing::debug!(
        points = points.len(),
        records = records.len(),
        "paired peaks into hash records"
    );

    records
}

/// Pack a pair into a single reproducible hash value.
///
/// Frequencies are quantized to whole Hz and the delta to whole
/// milliseconds, then bit-packed `anchor | target | delta`. No volatile or
/// process-local state enters the value, so identical point sets always
/// hash identically.
pub fn pack_hash(anchor_freq: f32, target_freq: f32, delta_secs: f32) -> u64 {
    let anchor = (anchor_freq.round() as u64) & FREQ_MASK;
    let target = (target_freq.round() as u64) & FREQ_MASK;
    let delta_ms = ((delta_secs * 1000.0).round() as u64) & DELTA_MASK;
    (anchor << (FREQ_BITS + DELTA_BITS)) | (target << DELTA_BITS) | delta_ms
}
