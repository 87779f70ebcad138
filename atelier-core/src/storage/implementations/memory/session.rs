//! In-memory SessionProvider implementation

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use crate::storage::traits::SessionProvider;
use crate::storage::types::AuthUser;

/// Fixed session: either nobody or one signed-in user
#[derive(Debug, Default)]
pub struct MemorySession {
    user: Mutex<Option<AuthUser>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: AuthUser) -> Self {
        Self {
            user: Mutex::new(Some(user)),
        }
    }
}

#[async_trait]
impl SessionProvider for MemorySession {
    async fn current_user(&self) -> Result<Option<AuthUser>> {
        Ok(self.user.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }
}
