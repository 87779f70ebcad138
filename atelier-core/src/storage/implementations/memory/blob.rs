//! In-memory BlobStore implementation

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::storage::traits::BlobStore;
use crate::storage::types::StoredObject;

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Vec<u8>,
    content_type: String,
}

/// In-memory object store. Public URLs use `base_url`.
#[derive(Debug)]
pub struct MemoryBlobStore {
    base_url: String,
    objects: Mutex<HashMap<(String, String), MemoryObject>>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::with_base_url("memory://storage")
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, bucket: &str, object_name: &str) -> Option<Vec<u8>> {
        self.lock()
            .get(&(bucket.to_string(), object_name.to_string()))
            .map(|o| o.data.clone())
    }

    pub fn content_type(&self, bucket: &str, object_name: &str) -> Option<String> {
        self.lock()
            .get(&(bucket.to_string(), object_name.to_string()))
            .map(|o| o.content_type.clone())
    }

    pub fn exists(&self, bucket: &str, object_name: &str) -> bool {
        self.get(bucket, object_name).is_some()
    }

    /// Object names in `bucket`, sorted
    pub fn list(&self, bucket: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .lock()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Place an object directly, bypassing upload rules
    pub fn seed(&self, bucket: &str, object_name: &str, data: &[u8]) {
        self.lock().insert(
            (bucket.to_string(), object_name.to_string()),
            MemoryObject {
                data: data.to_vec(),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), MemoryObject>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredObject> {
        let mut objects = self.lock();
        let id = (bucket.to_string(), object_name.to_string());
        if objects.contains_key(&id) {
            bail!("The resource already exists: {}/{}", bucket, object_name);
        }
        objects.insert(
            id,
            MemoryObject {
                data: data.to_vec(),
                content_type: content_type.to_string(),
            },
        );

        Ok(StoredObject {
            bucket: bucket.to_string(),
            object_name: object_name.to_string(),
            size: data.len(),
        })
    }

    fn public_url(&self, bucket: &str, object_name: &str) -> String {
        format!("{}/{}/{}", self.base_url, bucket, object_name)
    }

    async fn delete(&self, bucket: &str, object_names: &[String]) -> Result<()> {
        let mut objects = self.lock();
        for name in object_names {
            objects.remove(&(bucket.to_string(), name.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::helper::object_name_from_url;

    #[tokio::test]
    async fn test_upload_and_get() {
        let store = MemoryBlobStore::new();
        let stored = store
            .upload("images", "a.webp", b"RIFF", "image/webp")
            .await
            .unwrap();
        assert_eq!(stored.size, 4);
        assert_eq!(store.get("images", "a.webp").unwrap(), b"RIFF");
        assert_eq!(store.content_type("images", "a.webp").as_deref(), Some("image/webp"));
        assert!(!store.exists("other", "a.webp"));
    }

    #[tokio::test]
    async fn test_duplicate_upload_rejected() {
        let store = MemoryBlobStore::new();
        store.upload("images", "a.webp", b"1", "image/webp").await.unwrap();
        assert!(store.upload("images", "a.webp", b"2", "image/webp").await.is_err());
        assert_eq!(store.get("images", "a.webp").unwrap(), b"1");
    }

    #[tokio::test]
    async fn test_delete_ignores_missing() {
        let store = MemoryBlobStore::new();
        store.seed("images", "keep.webp", b"k");
        store.seed("images", "drop.webp", b"d");

        store
            .delete("images", &["drop.webp".to_string(), "ghost.webp".to_string()])
            .await
            .unwrap();
        assert_eq!(store.list("images"), vec!["keep.webp".to_string()]);
    }

    #[test]
    fn test_public_url_points_into_bucket() {
        let store = MemoryBlobStore::new();
        let url = store.public_url("images", "x.webp");
        assert_eq!(object_name_from_url(&url, "images").as_deref(), Some("x.webp"));
    }
}
