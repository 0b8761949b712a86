//! Library scanning and registration
//!
//! Walks a directory of recordings, fingerprints each supported file and
//! registers it: audio bytes go to the blob store under their SHA-256
//! content key, tag metadata and the hash records go to the fingerprint
//! store under a freshly allocated songID. Records are written only after
//! the full fingerprint set is computed, so an abandoned call never leaves
//! a partial set behind.

use std::fs;
use std::path::Path;

use lofty::{Accessor, Probe, TaggedFileExt};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;
use waveprint_engine::{
    fingerprint, BlobStore, EngineConfig, FingerprintStore, SongId, SongMetadata,
};

use crate::decode::decode_file;
use crate::error::RecognizerResult;

/// Supported audio file extensions.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a", "aac"];

/// How many of a file's hashes are probed to detect an already
/// registered recording.
const DUPLICATE_PROBE_HASHES: usize = 5;

/// Check if a file path has a supported audio extension.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Scan a library directory and register every supported recording.
///
/// Individual file failures are logged and skipped; the scan keeps going.
/// Returns the number of newly registered songs.
pub async fn scan_library<S, B>(
    store: &S,
    blob: &B,
    library_path: &Path,
    config: &EngineConfig,
) -> RecognizerResult<usize>
where
    S: FingerprintStore,
    B: BlobStore,
{
    let mut registered = 0usize;

    for entry in WalkDir::new(library_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_audio_file(path) {
            continue;
        }

        match register_file(store, blob, path, config).await {
            Ok(Some(song_id)) => {
                tracing::info!(song_id, path = %path.display(), "registered recording");
                registered += 1;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "skipping file");
            }
        }
    }

    Ok(registered)
}

/// Fingerprint one file and register it.
///
/// Returns `None` without touching the store when the file yields no
/// fingerprints (silence, too short) or is already registered.
pub async fn register_file<S, B>(
    store: &S,
    blob: &B,
    path: &Path,
    config: &EngineConfig,
) -> RecognizerResult<Option<SongId>>
where
    S: FingerprintStore,
    B: BlobStore,
{
    let signal = decode_file(path, config.sample_rate)?;
    let records = fingerprint(&signal, config)?;
    if records.is_empty() {
        tracing::warn!(path = %path.display(), "no fingerprintable content");
        return Ok(None);
    }

    for record in records.iter().take(DUPLICATE_PROBE_HASHES) {
        if store.contains_hash(record.hash).await? {
            tracing::info!(path = %path.display(), "already registered, skipping");
            return Ok(None);
        }
    }

    let bytes = fs::read(path)?;
    let blob_key = content_key(&bytes);
    blob.put(&blob_key, bytes).await?;

    let mut metadata = read_tags(path);
    metadata.blob_key = Some(blob_key);

    let song_id = store.next_song_id().await?;
    store.insert_song(song_id, metadata).await?;
    store.insert_records(song_id, &records).await?;

    Ok(Some(song_id))
}

/// SHA-256 hex digest used as the blob-store key.
fn content_key(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Read tag metadata, falling back to the file stem as the title.
fn read_tags(path: &Path) -> SongMetadata {
    let fallback_title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string);

    let tagged = match Probe::open(path).and_then(|probe| probe.read()) {
        Ok(tagged) => tagged,
        Err(err) => {
            tracing::debug!(error = %err, path = %path.display(), "no readable tags");
            return SongMetadata {
                title: fallback_title,
                ..Default::default()
            };
        }
    };

    let tag = tagged.primary_tag().or_else(|| tagged.first_tag());
    SongMetadata {
        artist: tag.and_then(|t| t.artist().map(|s| s.to_string())),
        title: tag
            .and_then(|t| t.title().map(|s| s.to_string()))
            .or(fallback_title),
        album: tag.and_then(|t| t.album().map(|s| s.to_string())),
        blob_key: None,
    }
}
