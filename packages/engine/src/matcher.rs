//! Query identification
//!
//! Looks up every hash of an unknown clip and votes with an offset-delta
//! histogram: each matching record contributes one vote to its
//! `(songID, storedOffset − queryOffset)` bucket. A true match keeps the
//! same anchor-to-anchor alignment across the whole clip, so its votes
//! pile into a single bucket while chance collisions scatter. The bucket
//! with the most votes wins, subject to a minimum-vote floor.
//!
//! Accumulation is commutative, so lookup order never affects the
//! decision. "No match" is a first-class successful outcome.

use std::collections::HashMap;

use crate::config::MatcherConfig;
use crate::pairing::HashRecord;
use crate::store::{FingerprintStore, SongId};

/// The matcher's decision for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    /// The best-matching stored recording.
    pub song_id: SongId,
    /// Votes in the winning offset-delta bucket.
    pub votes: u32,
    /// Position of the query within the stored recording, in seconds
    /// (stored offset minus query offset).
    pub offset_delta: f32,
}

/// Identify the recording a query hash set belongs to.
///
/// Returns `None` for an empty query, when no bucket reaches
/// `min_votes`, or when the store is unreachable — individual lookup
/// failures are logged and skipped so an outage degrades to "no match"
/// rather than a crash. Ties are broken deterministically: higher votes,
/// then lower songID, then lower offset delta.
pub async fn identify<S>(
    store: &S,
    query: &[HashRecord],
    config: &MatcherConfig,
) -> Option<MatchOutcome>
where
    S: FingerprintStore + ?Sized,
{
    if query.is_empty() {
        tracing::debug!("empty query hash set, nothing to identify");
        return None;
    }

    let mut histogram: HashMap<(SongId, i64), u32> = HashMap::new();
    let mut failed_lookups = 0usize;

    for record in query {
        let entries = match store.lookup(record.hash).await {
            Ok(entries) => entries,
            Err(err) => {
                failed_lookups += 1;
                tracing::warn!(error = %err, hash = record.hash, "fingerprint lookup failed");
                continue;
            }
        };
        for (song_id, stored_offset) in entries {
            let delta = stored_offset - record.offset;
            let bucket = (delta / config.offset_resolution).round() as i64;
            *histogram.entry((song_id, bucket)).or_insert(0) += 1;
        }
    }

    if failed_lookups > 0 {
        tracing::warn!(
            failed_lookups,
            total = query.len(),
            "store lookups failed during identification"
        );
    }

    let mut best: Option<((SongId, i64), u32)> = None;
    for (&key, &votes) in &histogram {
        let better = match best {
            None => true,
            Some((best_key, best_votes)) => {
                votes > best_votes || (votes == best_votes && key < best_key)
            }
        };
        if better {
            best = Some((key, votes));
        }
    }

    match best {
        Some(((song_id, bucket), votes)) if votes >= config.min_votes => {
            let outcome = MatchOutcome {
                song_id,
                votes,
                offset_delta: bucket as f32 * config.offset_resolution,
            };
            tracing::debug!(song_id, votes, delta = outcome.offset_delta, "query matched");
            Some(outcome)
        }
        _ => {
            tracing::debug!(
                best_votes = best.map(|(_, v)| v).unwrap_or(0),
                floor = config.min_votes,
                "no bucket reached the vote floor"
            );
            None
        }
    }
}
