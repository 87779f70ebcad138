//! RowStore trait for the hosted relational store

use anyhow::Result;
use async_trait::async_trait;

use crate::storage::types::{Filter, Row};

/// Table-oriented row storage with equality filters
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Insert `row`, or merge it into the existing row whose
    /// `conflict_column` value is equal.
    async fn upsert(&self, table: &str, conflict_column: &str, row: Row) -> Result<()>;

    /// First row matching `filter`, if any
    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>>;

    /// Merge `patch` into every row matching `filter` and return how many
    /// rows matched
    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<usize>;

    /// Insert a new row and return it as stored (with generated columns)
    async fn insert(&self, table: &str, row: Row) -> Result<Row>;

    /// Delete every row matching `filter`
    async fn delete(&self, table: &str, filter: &Filter) -> Result<()>;
}
