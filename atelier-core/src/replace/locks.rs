//! Per-key serialization of replacement runs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::storage::ids::ImageKey;

/// Async mutex per [`ImageKey`], created on first use
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<ImageKey, Arc<AsyncMutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other run holds `key`. Waiters are served in FIFO order.
    pub async fn acquire(&self, key: &ImageKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody holds or waits on so the map stays small.
            locks.retain(|k, l| k == key || Arc::strong_count(l) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of keys currently tracked
    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_waits() {
        let locks = Arc::new(KeyLocks::new());
        let key = ImageKey::slot("hero");

        let guard = locks.acquire(&key).await;
        let waiter = {
            let locks = locks.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&key).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_other_keys_do_not_wait() {
        let locks = KeyLocks::new();
        let _hero = locks.acquire(&ImageKey::slot("hero")).await;
        let _product = locks.acquire(&ImageKey::product("1")).await;
        assert_eq!(locks.tracked(), 2);
    }

    #[tokio::test]
    async fn test_released_keys_are_pruned() {
        let locks = KeyLocks::new();
        drop(locks.acquire(&ImageKey::slot("a")).await);
        drop(locks.acquire(&ImageKey::slot("b")).await);
        assert_eq!(locks.tracked(), 1);
    }
}
