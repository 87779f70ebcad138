//! BlobStore trait for bucketed object storage

use anyhow::Result;
use async_trait::async_trait;

use crate::storage::types::StoredObject;

/// Object storage with public URLs
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` under `object_name` in `bucket`.
    ///
    /// Fails if an object with that name already exists.
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredObject>;

    /// Stable public address of an object. Does not check existence.
    fn public_url(&self, bucket: &str, object_name: &str) -> String;

    /// Remove objects by name. Names that do not exist are ignored.
    async fn delete(&self, bucket: &str, object_names: &[String]) -> Result<()>;
}
