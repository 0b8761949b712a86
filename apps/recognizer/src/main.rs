//! Recognizer entry point
//!
//! Registers every recording under the configured library directory into
//! an in-memory fingerprint index, then identifies the query file given
//! on the command line.

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waveprint_engine::{fingerprint, identify, FingerprintStore, MemoryBlobStore, MemoryStore};
use waveprint_recognizer::{config::Config, decode, library};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waveprint_recognizer=info,waveprint_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let query_path = std::env::args()
        .nth(1)
        .context("usage: waveprint-recognizer <query-audio-file>")?;

    let engine_config = config.engine();
    let store = MemoryStore::new();
    let blob = MemoryBlobStore::new();

    tracing::info!(library = %config.library_path.display(), "indexing library");
    let registered =
        library::scan_library(&store, &blob, &config.library_path, &engine_config).await?;
    tracing::info!(
        registered,
        hashes = store.indexed_hashes().await,
        "library indexed"
    );

    let query_path = Path::new(&query_path);
    let signal = match decode::decode_file(query_path, engine_config.sample_rate) {
        Ok(signal) => signal,
        Err(err) => {
            tracing::error!(error = %err, path = %query_path.display(), "query rejected");
            println!("could not process this audio: {err}");
            return Ok(());
        }
    };

    let records = fingerprint(&signal, &engine_config)?;
    if let Some(export_path) = &config.export_path {
        let file = File::create(export_path)
            .with_context(|| format!("cannot create export file {}", export_path.display()))?;
        serde_json::to_writer_pretty(file, &records)?;
        tracing::info!(path = %export_path.display(), count = records.len(), "exported fingerprints");
    }
    if records.is_empty() {
        println!("could not process this audio: no fingerprintable content");
        return Ok(());
    }

    match identify(&store, &records, &config.matcher()).await {
        Some(outcome) => {
            let metadata = store.song(outcome.song_id).await?.unwrap_or_default();
            println!(
                "match: song {} ({} - {}) with {} votes at offset {:+.2}s",
                outcome.song_id,
                metadata.artist.as_deref().unwrap_or("unknown artist"),
                metadata.title.as_deref().unwrap_or("unknown title"),
                outcome.votes,
                outcome.offset_delta,
            );
        }
        None => println!("no match found"),
    }

    Ok(())
}
