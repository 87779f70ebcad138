//! In-memory RowStore implementation

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::storage::traits::RowStore;
use crate::storage::types::{Filter, Row};

#[derive(Debug, Default)]
struct Tables {
    tables: HashMap<String, Vec<Row>>,
    next_id: i64,
}

/// In-memory row store. `insert` assigns increasing numeric `id`s to rows
/// that do not carry one.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    inner: Mutex<Tables>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row directly
    pub fn seed(&self, table: &str, row: Row) {
        self.lock().tables.entry(table.to_string()).or_default().push(row);
    }

    /// Snapshot of a table's rows in insertion order
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn merge(target: &mut Row, patch: &Row) {
    for (column, value) in patch {
        target.insert(column.clone(), value.clone());
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn upsert(&self, table: &str, conflict_column: &str, row: Row) -> Result<()> {
        let Some(key) = row.get(conflict_column).cloned() else {
            bail!("upsert into {} is missing conflict column {}", table, conflict_column);
        };
        let filter = Filter::eq(conflict_column, key);

        let mut inner = self.lock();
        let rows = inner.tables.entry(table.to_string()).or_default();
        match rows.iter_mut().find(|r| filter.matches(r)) {
            Some(existing) => merge(existing, &row),
            None => rows.push(row),
        }
        Ok(())
    }

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>> {
        let inner = self.lock();
        Ok(inner
            .tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| filter.matches(r)).cloned()))
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<usize> {
        let mut inner = self.lock();
        let Some(rows) = inner.tables.get_mut(table) else {
            return Ok(0);
        };
        let mut matched = 0;
        for row in rows.iter_mut().filter(|r| filter.matches(r)) {
            merge(row, &patch);
            matched += 1;
        }
        Ok(matched)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row> {
        let mut inner = self.lock();
        if !row.contains_key("id") {
            inner.next_id += 1;
            row.insert("id".to_string(), Value::from(inner.next_id));
        }
        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<()> {
        let mut inner = self.lock();
        if let Some(rows) = inner.tables.get_mut(table) {
            rows.retain(|r| !filter.matches(r));
        }
        Ok(())
    }
}
