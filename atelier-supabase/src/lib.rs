//! Adapters for the hosted project behind the atelier site
//!
//! - `SupabaseBlobStore` - object storage (`/storage/v1`)
//! - `PostgrestStore` - tables (`/rest/v1`)
//! - `SupabaseAuth` - password sign-in and session (`/auth/v1`)
//!
//! All three share one [`Client`], so once `SupabaseAuth` has signed in the
//! stores act as that user.

pub mod auth;
pub mod client;
pub mod rest;
pub mod storage;

pub use auth::SupabaseAuth;
pub use client::Client;
pub use rest::PostgrestStore;
pub use storage::SupabaseBlobStore;

use std::sync::Arc;

use atelier_core::storage::StorageTypes;

/// Storage bundle for the hosted project
pub struct Supabase;

impl StorageTypes for Supabase {
    type Blob = SupabaseBlobStore;
    type Rows = PostgrestStore;
}

/// The three adapters of one project, sharing a client
#[derive(Clone)]
pub struct SupabaseProject {
    pub client: Client,
    pub blobs: Arc<SupabaseBlobStore>,
    pub rows: Arc<PostgrestStore>,
    pub auth: Arc<SupabaseAuth>,
}

impl SupabaseProject {
    pub fn connect(url: &str, api_key: &str) -> anyhow::Result<Self> {
        let client = Client::new(url, api_key)?;
        Ok(Self {
            blobs: Arc::new(SupabaseBlobStore::new(client.clone())),
            rows: Arc::new(PostgrestStore::new(client.clone())),
            auth: Arc::new(SupabaseAuth::new(client.clone())),
            client,
        })
    }
}
