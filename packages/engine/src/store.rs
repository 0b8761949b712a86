//! Fingerprint store contract
//!
//! The store persists (hash → songID, offset) associations and song
//! metadata. The engine only ever talks to it through this narrow insert
//! and lookup contract; records are append-only and the engine never
//! mutates them after creation. Real deployments back this with a
//! key-value service; [`MemoryStore`] is the reference implementation used
//! by the app and the test suite.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::EngineResult;
use crate::pairing::HashRecord;

/// Identity shared by every hash record of one fingerprinting call.
///
/// Allocated monotonically by the store, never by in-pipeline state.
pub type SongId = u64;

/// Descriptive metadata stored next to a song's hash records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongMetadata {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    /// Content-addressed key of the original audio bytes in the blob
    /// store.
    pub blob_key: Option<String>,
}

/// Persistence contract for fingerprint records.
///
/// Implementations must provide at-least per-record insert atomicity;
/// concurrent fingerprinting calls share a store only through these
/// methods. Connectivity failures and throttling surface as
/// [`crate::EngineError::StoreUnavailable`] and must never be reported as
/// partial success.
#[async_trait]
pub trait FingerprintStore: Send + Sync {
    /// Allocate a fresh song identity. Monotonic per store.
    async fn next_song_id(&self) -> EngineResult<SongId>;

    /// Store a song's metadata.
    async fn insert_song(&self, song_id: SongId, metadata: SongMetadata) -> EngineResult<()>;

    /// Bulk-insert the hash records of one fingerprinting call.
    async fn insert_records(&self, song_id: SongId, records: &[HashRecord]) -> EngineResult<()>;

    /// All stored (songID, offset) entries sharing this exact hash value.
    async fn lookup(&self, hash: u64) -> EngineResult<Vec<(SongId, f32)>>;

    /// Metadata for a previously inserted song.
    async fn song(&self, song_id: SongId) -> EngineResult<Option<SongMetadata>>;

    /// Whether any record with this hash exists. Used for duplicate
    /// detection before registering a song.
    async fn contains_hash(&self, hash: u64) -> EngineResult<bool> {
        Ok(!self.lookup(hash).await?.is_empty())
    }
}

/// In-memory fingerprint store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: AtomicU64,
    index: RwLock<HashMap<u64, Vec<(SongId, f32)>>>,
    songs: RwLock<HashMap<SongId, SongMetadata>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct hash values in the index.
    pub async fn indexed_hashes(&self) -> usize {
        self.index.read().await.len()
    }
}

#[async_trait]
impl FingerprintStore for MemoryStore {
    async fn next_song_id(&self) -> EngineResult<SongId> {
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    async fn insert_song(&self, song_id: SongId, metadata: SongMetadata) -> EngineResult<()> {
        self.songs.write().await.insert(song_id, metadata);
        Ok(())
    }

    async fn insert_records(&self, song_id: SongId, records: &[HashRecord]) -> EngineResult<()> {
        let mut index = self.index.write().await;
        for record in records {
            index
                .entry(record.hash)
                .or_default()
                .push((song_id, record.offset));
        }
        Ok(())
    }

    async fn lookup(&self, hash: u64) -> EngineResult<Vec<(SongId, f32)>> {
        Ok(self
            .index
            .read()
            .await
            .get(&hash)
            .cloned()
            .unwrap_or_default())
    }

    async fn song(&self, song_id: SongId) -> EngineResult<Option<SongMetadata>> {
        Ok(self.songs.read().await.get(&song_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hash: u64, offset: f32) -> HashRecord {
        HashRecord { hash, offset }
    }

    #[tokio::test]
    async fn test_song_ids_are_monotonic() {
        let store = MemoryStore::new();
        let first = store.next_song_id().await.unwrap();
        let second = store.next_song_id().await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn test_lookup_returns_all_entries_for_hash() {
        let store = MemoryStore::new();
        store
            .insert_records(1, &[record(42, 0.5), record(42, 1.5)])
            .await
            .unwrap();
        store.insert_records(2, &[record(42, 7.0)]).await.unwrap();

        let mut entries = store.lookup(42).await.unwrap();
        entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
        assert_eq!(entries, vec![(1, 0.5), (1, 1.5), (2, 7.0)]);
    }

    #[tokio::test]
    async fn test_lookup_unknown_hash_is_empty() {
        let store = MemoryStore::new();
        assert!(store.lookup(99).await.unwrap().is_empty());
        assert!(!store.contains_hash(99).await.unwrap());
    }

    #[tokio::test]
    async fn test_song_metadata_roundtrip() {
        let store = MemoryStore::new();
        let metadata = SongMetadata {
            artist: Some("Unknown Artist".into()),
            title: Some("Test Tone".into()),
            album: None,
            blob_key: Some("abc123".into()),
        };
        store.insert_song(7, metadata.clone()).await.unwrap();

        assert_eq!(store.song(7).await.unwrap(), Some(metadata));
        assert_eq!(store.song(8).await.unwrap(), None);
    }
}
