//! In-process storage backend

use crate::backend::{StorageBackend, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

/// Backend that keeps objects in a map
///
/// Honours the same no-overwrite rule as a real backend. Public URLs use
/// the `memory://bucket/key` scheme.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
}

impl MemoryStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored bytes for `bucket/key`, if any
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.data.clone())
    }

    /// Content type recorded for `bucket/key`, if any
    #[must_use]
    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.content_type.clone())
    }

    /// Keys currently held in `bucket`, sorted
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut objects = self.objects.lock();
        let id = (bucket.to_string(), key.to_string());
        if objects.contains_key(&id) {
            return Err(StorageError::AlreadyExists {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        objects.insert(
            id,
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("memory://{bucket}/{key}")
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .remove(&(bucket.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_remove() {
        let store = MemoryStore::new();
        store
            .put("b", "k", Bytes::from_static(b"data"), "image/png")
            .await
            .unwrap();

        assert_eq!(store.keys("b"), vec!["k".to_string()]);
        assert_eq!(store.len(), 1);

        store.remove("b", "k").await.unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.remove("b", "k").await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn never_overwrites() {
        let store = MemoryStore::new();
        store.put("b", "k", Bytes::from_static(b"one"), "image/png").await.unwrap();

        let result = store.put("b", "k", Bytes::from_static(b"two"), "image/png").await;

        assert!(matches!(result, Err(StorageError::AlreadyExists { .. })));
        assert_eq!(store.object("b", "k").unwrap(), Bytes::from_static(b"one"));
    }
}
