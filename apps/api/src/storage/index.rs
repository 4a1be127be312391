//! Index Manager — single point of read-modify-write access to the index object.
//!
//! The index is one object rewritten whole on every change. Writers in this process
//! are serialised by `write_lock`; writers in other processes can still overwrite
//! each other (last writer wins), which may drop an entry from the index but never
//! loses a conversation object.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::storage::backend::{ObjectBackend, StorageError};
use crate::storage::codec::{decode_index, encode_index, CONTENT_TYPE};
use crate::storage::models::{ConversationSummary, Index};

pub const INDEX_KEY: &str = "conversations/index.json";

pub struct IndexManager {
    backend: Arc<dyn ObjectBackend>,
    bucket: String,
    write_lock: Mutex<()>,
}

impl IndexManager {
    pub fn new(backend: Arc<dyn ObjectBackend>, bucket: String) -> Self {
        Self {
            backend,
            bucket,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the index, or an empty one if it is missing, unreadable or unparsable.
    pub async fn load_index(&self) -> Index {
        match self.read_index().await {
            Ok(index) => index,
            Err(e) => {
                warn!("Failed to load conversation index: {e}");
                Index::new()
            }
        }
    }

    /// Writes the whole index. Returns false if encoding or the write failed.
    pub async fn save_index(&self, index: &Index) -> bool {
        let body = match encode_index(index) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to encode conversation index: {e}");
                return false;
            }
        };
        match self
            .backend
            .put(&self.bucket, INDEX_KEY, Bytes::from(body), CONTENT_TYPE)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save conversation index: {e}");
                false
            }
        }
    }

    /// Inserts or replaces the entry for `summary.id`.
    pub async fn upsert(&self, summary: ConversationSummary) -> bool {
        let _guard = self.write_lock.lock().await;
        let mut index = match self.read_index().await {
            Ok(index) => index,
            Err(e) => {
                warn!("Index unreadable, skipping update for {}: {e}", summary.id);
                return false;
            }
        };
        index.insert(summary.id.clone(), summary);
        self.save_index(&index).await
    }

    /// Removes the entry for `id`. An absent entry counts as success.
    pub async fn remove(&self, id: &str) -> bool {
        let _guard = self.write_lock.lock().await;
        let mut index = match self.read_index().await {
            Ok(index) => index,
            Err(e) => {
                warn!("Index unreadable, skipping removal of {id}: {e}");
                return false;
            }
        };
        if index.remove(id).is_none() {
            return true;
        }
        self.save_index(&index).await
    }

    /// A missing or corrupt index reads as empty; only a failing backend is an
    /// error, so a transient outage never causes the index to be overwritten.
    async fn read_index(&self) -> Result<Index, StorageError> {
        let bytes = match self.backend.get(&self.bucket, INDEX_KEY).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => {
                debug!("Conversation index does not exist yet");
                return Ok(Index::new());
            }
            Err(e) => return Err(e),
        };
        match decode_index(&bytes) {
            Ok(index) => Ok(index),
            Err(e) => {
                warn!("Conversation index is corrupt, starting fresh: {e}");
                Ok(Index::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::{MemoryBackend, UnavailableBackend};
    use chrono::Utc;

    fn summary(id: &str) -> ConversationSummary {
        ConversationSummary {
            id: id.to_string(),
            title: format!("Title {id}"),
            preview: String::new(),
            updated_at: Utc::now(),
        }
    }

    fn manager(backend: Arc<dyn ObjectBackend>) -> IndexManager {
        IndexManager::new(backend, "bucket".to_string())
    }

    #[tokio::test]
    async fn test_missing_index_loads_empty() {
        let index = manager(Arc::new(MemoryBackend::new()));
        assert!(index.load_index().await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_creates_index_lazily() {
        let backend = Arc::new(MemoryBackend::new());
        let index = manager(backend.clone());

        assert!(index.upsert(summary("a")).await);
        assert!(index.upsert(summary("b")).await);

        let loaded = index.load_index().await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["a"].title, "Title a");
        assert!(backend.get("bucket", INDEX_KEY).await.is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_index_loads_empty_and_is_rebuilt() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .put("bucket", INDEX_KEY, Bytes::from_static(b"{not json"), CONTENT_TYPE)
            .await
            .unwrap();
        let index = manager(backend);

        assert!(index.load_index().await.is_empty());
        assert!(index.upsert(summary("a")).await);
        assert_eq!(index.load_index().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_absent_entry_is_success() {
        let index = manager(Arc::new(MemoryBackend::new()));
        assert!(index.remove("ghost").await);
    }

    #[tokio::test]
    async fn test_remove_drops_only_that_entry() {
        let index = manager(Arc::new(MemoryBackend::new()));
        index.upsert(summary("a")).await;
        index.upsert(summary("b")).await;

        assert!(index.remove("a").await);

        let loaded = index.load_index().await;
        assert!(!loaded.contains_key("a"));
        assert!(loaded.contains_key("b"));
    }

    #[tokio::test]
    async fn test_unavailable_backend_degrades() {
        let index = manager(Arc::new(UnavailableBackend));
        assert!(index.load_index().await.is_empty());
        assert!(!index.save_index(&Index::new()).await);
        assert!(!index.upsert(summary("a")).await);
        assert!(!index.remove("a").await);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_in_one_process_keep_every_entry() {
        let index = Arc::new(manager(Arc::new(MemoryBackend::new())));
        let writers: Vec<_> = (0..16)
            .map(|i| {
                let index = index.clone();
                tokio::spawn(async move { index.upsert(summary(&format!("c{i}"))).await })
            })
            .collect();
        for writer in writers {
            assert!(writer.await.unwrap());
        }
        assert_eq!(index.load_index().await.len(), 16);
    }
}
