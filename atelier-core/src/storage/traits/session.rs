//! SessionProvider trait for the hosted auth service

use anyhow::Result;
use async_trait::async_trait;

use crate::storage::types::AuthUser;

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The signed-in user, or None without a session
    async fn current_user(&self) -> Result<Option<AuthUser>>;
}
