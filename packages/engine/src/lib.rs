//! Spectral peak-pairing audio fingerprinting
//!
//! Turns a mono PCM signal into a compact set of hashes that survive
//! noise, re-encoding and partial capture, and identifies unknown clips
//! against a store of previously fingerprinted recordings:
//!
//! 1. [`spectrogram`] — short-time Fourier transform power matrix
//! 2. [`peaks`] — locally-maximal, density-capped salient points
//! 3. [`pairing`] — anchor/target-zone pairs hashed on frequencies and
//!    time delta
//! 4. [`matcher`] — offset-delta histogram voting against a
//!    [`store::FingerprintStore`]
//!
//! The pipeline is synchronous and CPU-bound; only the store and blob
//! contracts suspend. [`fingerprint`] runs steps 1–3 in one call.

pub mod blob;
pub mod config;
pub mod error;
pub mod matcher;
pub mod pairing;
pub mod peaks;
pub mod signal;
pub mod spectrogram;
pub mod store;

pub use blob::{BlobStore, MemoryBlobStore};
pub use config::{EngineConfig, MatcherConfig};
pub use error::{EngineError, EngineResult};
pub use matcher::{identify, MatchOutcome};
pub use pairing::{CoordinatePoint, HashRecord};
pub use peaks::Peak;
pub use signal::Signal;
pub use spectrogram::{Spectrogram, SpectrogramBuilder};
pub use store::{FingerprintStore, MemoryStore, SongId, SongMetadata};

/// Fingerprint a mono signal: spectrogram, peaks, coordinate translation,
/// pairing.
///
/// Returns the hash records of one fingerprinting call, ready for a bulk
/// store insert under a single songID. An empty list (silence, too-short
/// clip) is a valid "cannot fingerprint" result, not an error.
pub fn fingerprint(signal: &Signal, config: &EngineConfig) -> EngineResult<Vec<HashRecord>> {
    let mut builder = SpectrogramBuilder::new(config)?;
    let spectrogram = builder.build(signal)?;
    let extracted = peaks::extract(&spectrogram, config);
    let points = pairing::coordinates(&extracted, &spectrogram);
    let records = pairing::pair(&points, config);

    tracing::debug!(
        duration_secs = signal.duration_secs(),
        peaks = extracted.len(),
        records = records.len(),
        "fingerprinted signal"
    );

    Ok(records)
}
