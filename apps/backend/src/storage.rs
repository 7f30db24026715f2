//! # Object Storage
//!
//! The storage collaborator contract used for product images, plus an
//! in-process implementation for tests and local runs.
//!
//! Keys are always derived through `TenantNamespace`, so every object lives
//! under `tenants/{tenant_token}/` and two tenants can never share a key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use tillpoint_core::object_key::ObjectKey;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Object storage backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `key`, replacing any previous object.
    async fn put(&self, key: &ObjectKey, bytes: Vec<u8>, content_type: &str)
        -> Result<(), StorageError>;

    /// Reads the object under `key`.
    async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, StorageError>;

    /// Presigned URL valid for `ttl`; an upload (PUT) URL when `for_upload`.
    async fn presign(
        &self,
        key: &ObjectKey,
        ttl: Duration,
        for_upload: bool,
    ) -> Result<String, StorageError>;
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// HashMap-backed store. Presigned URLs use a `memory://` scheme.
#[derive(Debug, Clone)]
pub struct InMemoryObjectStore {
    bucket: String,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl InMemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Content type recorded for `key`, if stored.
    pub async fn content_type(&self, key: &ObjectKey) -> Option<String> {
        self.objects
            .read()
            .await
            .get(key.as_str())
            .map(|o| o.content_type.clone())
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(
        &self,
        key: &ObjectKey,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        debug!(bucket = %self.bucket, key = %key, size = bytes.len(), "Storing object");
        self.objects.write().await.insert(
            key.as_str().to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(key.as_str())
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn presign(
        &self,
        key: &ObjectKey,
        ttl: Duration,
        for_upload: bool,
    ) -> Result<String, StorageError> {
        let method = if for_upload { "PUT" } else { "GET" };
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(format!(
            "memory://{}/{}?method={}&expires={}",
            self.bucket, key, method, expires
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = InMemoryObjectStore::new("tillpoint");
        let key = ObjectKey::from_stored("tenants/ABC/products/XYZ_1.png");

        store.put(&key, vec![1, 2, 3], "image/png").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(store.content_type(&key).await.as_deref(), Some("image/png"));
        assert_eq!(store.len().await, 1);

        let missing = ObjectKey::from_stored("tenants/ABC/products/none.png");
        assert!(matches!(store.get(&missing).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_presign() {
        let store = InMemoryObjectStore::new("tillpoint");
        let key = ObjectKey::from_stored("tenants/ABC/products/XYZ_1.png");

        let url = store.presign(&key, Duration::from_secs(900), true).await.unwrap();
        assert!(url.starts_with("memory://tillpoint/tenants/ABC/products/XYZ_1.png?method=PUT"));

        let url = store.presign(&key, Duration::from_secs(3600), false).await.unwrap();
        assert!(url.contains("method=GET"));
    }
}
