//! Object backends the conversation store runs on.
//!
//! `S3Backend` talks to any S3-compatible service. `MemoryBackend` keeps objects in
//! process. `UnavailableBackend` stands in when no real backend could be configured,
//! so every store operation degrades to its "nothing happened" outcome.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::S3Settings;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage backend unavailable")]
    Unavailable,

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Writes the whole object, overwriting any previous version.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Reads the whole object. A missing key is `StorageError::NotFound`.
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError>;

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

// ────────────────────────────────────────────────────────────────────────────
// S3
// ────────────────────────────────────────────────────────────────────────────

pub struct S3Backend {
    client: aws_sdk_s3::Client,
}

impl S3Backend {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Builds a client for an S3-compatible endpoint (MinIO, AIOZ, AWS) with
    /// static credentials and path-style addressing.
    pub async fn connect(settings: &S3Settings<'_>) -> Self {
        let credentials = Credentials::new(
            settings.access_key_id,
            settings.secret_access_key,
            None,
            None,
            "neostudio-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.to_string()))
            .credentials_provider(credentials)
            .endpoint_url(settings.endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        info!("S3 backend configured for {}", settings.endpoint);
        Self::new(aws_sdk_s3::Client::from_conf(s3_config))
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("put {key}: {}", DisplayErrorContext(&e))))?;
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    return Err(StorageError::NotFound(key.to_string()));
                }
                return Err(StorageError::Backend(format!(
                    "get {key}: {}",
                    DisplayErrorContext(&e)
                )));
            }
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("read {key}: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                StorageError::Backend(format!("delete {key}: {}", DisplayErrorContext(&e)))
            })?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-process
// ────────────────────────────────────────────────────────────────────────────

/// In-process backend. Deleting a missing key succeeds, as on S3.
#[derive(Default)]
pub struct MemoryBackend {
    objects: RwLock<HashMap<(String, String), Bytes>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Unavailable
// ────────────────────────────────────────────────────────────────────────────

/// Substituted when no real backend can be constructed. Every call fails.
#[derive(Debug, Default)]
pub struct UnavailableBackend;

#[async_trait]
impl ObjectBackend for UnavailableBackend {
    async fn put(&self, _: &str, _: &str, _: Bytes, _: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    async fn get(&self, _: &str, _: &str) -> Result<Bytes, StorageError> {
        Err(StorageError::Unavailable)
    }

    async fn delete(&self, _: &str, _: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_put_get_delete() {
        let backend = MemoryBackend::new();
        backend
            .put("bucket", "a.json", Bytes::from_static(b"{}"), "application/json")
            .await
            .unwrap();
        assert_eq!(backend.get("bucket", "a.json").await.unwrap(), "{}");

        backend.delete("bucket", "a.json").await.unwrap();
        assert!(matches!(
            backend.get("bucket", "a.json").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_backend_isolates_buckets() {
        let backend = MemoryBackend::new();
        backend
            .put("one", "k", Bytes::from_static(b"1"), "text/plain")
            .await
            .unwrap();
        assert!(backend.get("two", "k").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_backend_delete_missing_key_succeeds() {
        let backend = MemoryBackend::new();
        assert!(backend.delete("bucket", "missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_backend_fails_everything() {
        let backend = UnavailableBackend;
        assert!(matches!(
            backend.get("b", "k").await,
            Err(StorageError::Unavailable)
        ));
        assert!(backend.put("b", "k", Bytes::new(), "x").await.is_err());
        assert!(backend.delete("b", "k").await.is_err());
    }
}
