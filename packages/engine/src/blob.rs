//! Blob store contract
//!
//! Holds the original audio bytes addressable by key. The engine core
//! never reads audio from here; it exists for the surrounding app, which
//! stores each registered recording under its content key. Real
//! deployments back this with an object store; [`MemoryBlobStore`] is the
//! in-process reference implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use url::Url;

use crate::error::{EngineError, EngineResult};

/// Object storage contract for original audio bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a key, replacing any previous object.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> EngineResult<()>;

    /// Fetch the bytes stored under a key.
    async fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>>;

    /// A URL from which the object can be read without credentials.
    ///
    /// Issued without checking existence, matching object-store presign
    /// semantics.
    async fn presigned_read_url(&self, key: &str) -> EngineResult<Url>;
}

/// In-memory blob store issuing `memory://` read URLs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> EngineResult<()> {
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn presigned_read_url(&self, key: &str) -> EngineResult<Url> {
        Url::parse(&format!("memory://{key}"))
            .map_err(|e| EngineError::BlobUnavailable(format!("invalid object key {key:?}: {e}")))
    }
}
