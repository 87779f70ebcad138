//! Mock row store for testing

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Semaphore;

use crate::storage::implementations::memory::MemoryRowStore;
use crate::storage::traits::RowStore;
use crate::storage::types::{Filter, Row};

/// Memory row store with failure switches, call recording and a write gate
#[derive(Debug, Default)]
pub struct MockRowStore {
    inner: MemoryRowStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    calls: AtomicUsize,
    writes: Mutex<Vec<(String, Row)>>,
    gate: Option<Semaphore>,
    arrived: AtomicUsize,
}

impl MockRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose upserts and updates wait for [`release_write`](Self::release_write)
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    /// Let one waiting write through (writers are released in arrival order)
    pub fn release_write(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    /// Writes that reached the gate, released or not
    pub fn arrived_writes(&self) -> usize {
        self.arrived.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Total number of calls that reached the store
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Applied upserts and updates, in the order they hit the store
    pub fn writes(&self) -> Vec<(String, Row)> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn memory(&self) -> &MemoryRowStore {
        &self.inner
    }

    async fn pass_gate(&self) -> Result<()> {
        self.arrived.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("permission denied for table");
        }
        Ok(())
    }

    fn record(&self, table: &str, row: &Row) {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((table.to_string(), row.clone()));
    }
}

#[async_trait]
impl RowStore for MockRowStore {
    async fn upsert(&self, table: &str, conflict_column: &str, row: Row) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await?;
        self.check_write()?;
        self.record(table, &row);
        self.inner.upsert(table, conflict_column, row).await
    }

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("JSON object requested, multiple (or no) rows returned");
        }
        self.inner.select_one(table, filter).await
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await?;
        self.check_write()?;
        self.record(table, &patch);
        self.inner.update(table, filter, patch).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        self.inner.insert(table, row).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        self.inner.delete(table, filter).await
    }
}
