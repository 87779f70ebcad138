//! Object storage adapter

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder};
use serde_json::json;
use tracing::debug;

use atelier_core::storage::{BlobStore, StoredObject};

use crate::client::Client;

/// Cache lifetime of uploaded objects
const CACHE_CONTROL: &str = "max-age=3600";

#[derive(Clone)]
pub struct SupabaseBlobStore {
    client: Client,
}

impl SupabaseBlobStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn upload_request(&self, bucket: &str, object_name: &str, data: &[u8], content_type: &str) -> RequestBuilder {
        let url = self
            .client
            .url(&format!("/storage/v1/object/{}/{}", bucket, object_name));
        self.client
            .request(Method::POST, &url)
            .header(CONTENT_TYPE, content_type)
            .header("cache-control", CACHE_CONTROL)
            .header("x-upsert", "false")
            .body(data.to_vec())
    }

    fn delete_request(&self, bucket: &str, object_names: &[String]) -> RequestBuilder {
        let url = self.client.url(&format!("/storage/v1/object/{}", bucket));
        self.client
            .request(Method::DELETE, &url)
            .json(&json!({ "prefixes": object_names }))
    }
}

#[async_trait]
impl BlobStore for SupabaseBlobStore {
    async fn upload(&self, bucket: &str, object_name: &str, data: &[u8], content_type: &str) -> Result<StoredObject> {
        self.client
            .send(self.upload_request(bucket, object_name, data, content_type))
            .await?;
        debug!(bucket, object = object_name, size = data.len(), "uploaded object");
        Ok(StoredObject {
            bucket: bucket.to_string(),
            object_name: object_name.to_string(),
            size: data.len(),
        })
    }

    fn public_url(&self, bucket: &str, object_name: &str) -> String {
        self.client
            .url(&format!("/storage/v1/object/public/{}/{}", bucket, object_name))
    }

    async fn delete(&self, bucket: &str, object_names: &[String]) -> Result<()> {
        if object_names.is_empty() {
            return Ok(());
        }
        self.client
            .send(self.delete_request(bucket, object_names))
            .await?;
        debug!(bucket, objects = ?object_names, "deleted objects");
        Ok(())
    }
}
