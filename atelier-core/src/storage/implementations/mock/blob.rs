//! Mock blob store for testing

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::storage::implementations::memory::MemoryBlobStore;
use crate::storage::traits::BlobStore;
use crate::storage::types::StoredObject;

/// Memory blob store with failure switches and call recording
#[derive(Debug, Default)]
pub struct MockBlobStore {
    inner: MemoryBlobStore,
    fail_upload: AtomicBool,
    fail_delete: AtomicBool,
    uploads: AtomicUsize,
    deletes: Mutex<Vec<Vec<String>>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_upload.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Number of upload calls, failed ones included
    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Names passed to each delete call, failed ones included
    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.deletes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Total number of calls that reached the store
    pub fn calls(&self) -> usize {
        self.upload_calls() + self.delete_calls().len()
    }

    /// The wrapped memory store
    pub fn memory(&self) -> &MemoryBlobStore {
        &self.inner
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredObject> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload.load(Ordering::SeqCst) {
            bail!("new row violates row-level security policy");
        }
        self.inner.upload(bucket, object_name, data, content_type).await
    }

    fn public_url(&self, bucket: &str, object_name: &str) -> String {
        self.inner.public_url(bucket, object_name)
    }

    async fn delete(&self, bucket: &str, object_names: &[String]) -> Result<()> {
        self.deletes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(object_names.to_vec());
        if self.fail_delete.load(Ordering::SeqCst) {
            bail!("Object not found");
        }
        self.inner.delete(bucket, object_names).await
    }
}
