//! Conversation Store — the public persistence API.
//!
//! Persistence is best-effort: no operation here returns an error. Backend and
//! decoding failures become `None`, `false` or an empty list, and are logged.
//!
//! Layout in the bucket:
//! - `conversations/{id}.json` — one conversation
//! - `conversations/index.json` — id -> summary, used for listing

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::storage::backend::{ObjectBackend, StorageError};
use crate::storage::codec::{decode_conversation, encode_conversation, CONTENT_TYPE};
use crate::storage::index::IndexManager;
use crate::storage::models::{Conversation, ConversationSummary, ConversationUpdate};

pub fn conversation_key(id: &str) -> String {
    format!("conversations/{id}.json")
}

/// Result of [`ConversationStore::save`].
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub conversation: Conversation,
    /// False when the document write was skipped or failed.
    pub persisted: bool,
}

pub struct ConversationStore {
    backend: Arc<dyn ObjectBackend>,
    bucket: String,
    index: IndexManager,
}

impl ConversationStore {
    pub fn new(backend: Arc<dyn ObjectBackend>, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        Self {
            index: IndexManager::new(backend.clone(), bucket.clone()),
            backend,
            bucket,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Loads a conversation. Missing, unreadable and malformed objects are all `None`.
    pub async fn load(&self, id: &str) -> Option<Conversation> {
        match self.read(id).await {
            Ok(conversation) => conversation,
            Err(e) => {
                warn!("Failed to load conversation {id}: {e}");
                None
            }
        }
    }

    /// Lists conversations newest first. Index entries whose conversation cannot
    /// be loaded are skipped; an unreachable backend yields an empty list.
    pub async fn list(&self) -> Vec<ConversationSummary> {
        let index = self.index.load_index().await;
        let mut summaries = Vec::with_capacity(index.len());

        for id in index.keys() {
            match self.load(id).await {
                Some(conversation) => summaries.push(conversation.list_summary()),
                None => debug!("Skipping orphaned index entry {id}"),
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }

    /// Creates a conversation or partially updates an existing one, then
    /// refreshes its index entry.
    ///
    /// An id that does not resolve creates a new conversation under that id; no id
    /// generates one. The returned conversation reflects what was (or would have
    /// been) written, even when persistence failed.
    pub async fn create_or_update(&self, update: ConversationUpdate) -> Conversation {
        self.save(update).await.conversation
    }

    /// [`create_or_update`](Self::create_or_update), also reporting whether the
    /// document was written.
    ///
    /// If the existing document cannot be read because the backend failed, nothing
    /// is written: building a fresh document in its place would overwrite fields
    /// the update does not carry.
    pub async fn save(&self, update: ConversationUpdate) -> SaveOutcome {
        let now = Utc::now();
        let requested_id = update.id.clone().filter(|id| !id.trim().is_empty());

        let (mut conversation, readable) = match requested_id {
            Some(id) => match self.read(&id).await {
                Ok(Some(existing)) => (existing, true),
                Ok(None) => (Conversation::new(id, now), true),
                Err(e) => {
                    warn!("Cannot read conversation {id} before updating it: {e}");
                    (Conversation::new(id, now), false)
                }
            },
            None => (Conversation::new(Uuid::new_v4().to_string(), now), true),
        };

        conversation.apply(update);
        conversation.derive_preview();
        conversation.updated_at = Utc::now();

        if !readable || !self.write(&conversation).await {
            warn!(
                "Conversation {} was not saved; index left unchanged",
                conversation.id
            );
            return SaveOutcome {
                conversation,
                persisted: false,
            };
        }

        if !self.index.upsert(conversation.summary()).await {
            warn!(
                "Conversation {} saved but its index entry was not updated",
                conversation.id
            );
        }

        SaveOutcome {
            conversation,
            persisted: true,
        }
    }

    /// Deletes a conversation and then its index entry. Returns false if the
    /// object delete failed, in which case the index is left alone.
    pub async fn delete(&self, id: &str) -> bool {
        let key = conversation_key(id);
        if let Err(e) = self.backend.delete(&self.bucket, &key).await {
            warn!("Failed to delete conversation {id}: {e}");
            return false;
        }

        if !self.index.remove(id).await {
            warn!("Conversation {id} deleted but its index entry was not removed");
        }
        info!("Deleted conversation {id}");
        true
    }

    /// `Ok(None)` when the object is missing or malformed; `Err` only when the
    /// backend itself failed.
    async fn read(&self, id: &str) -> Result<Option<Conversation>, StorageError> {
        let bytes = match self.backend.get(&self.bucket, &conversation_key(id)).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => {
                debug!("Conversation {id} not found");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match decode_conversation(&bytes) {
            Ok(conversation) => Ok(Some(conversation)),
            Err(e) => {
                warn!("Conversation {id} is malformed: {e}");
                Ok(None)
            }
        }
    }

    async fn write(&self, conversation: &Conversation) -> bool {
        let body = match encode_conversation(conversation) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to encode conversation {}: {e}", conversation.id);
                return false;
            }
        };
        let key = conversation_key(&conversation.id);
        match self
            .backend
            .put(&self.bucket, &key, Bytes::from(body), CONTENT_TYPE)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save conversation {}: {e}", conversation.id);
                false
            }
        }
    }
}
