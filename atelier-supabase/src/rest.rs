//! Row store over the PostgREST interface

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use tracing::trace;

use atelier_core::storage::{Filter, Row, RowStore};

use crate::client::Client;

const PREFER: &str = "Prefer";

#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
}

/// `column=eq.value` query pair
fn eq_param(filter: &Filter) -> (String, String) {
    (filter.column.clone(), format!("eq.{}", filter.value_text()))
}

impl PostgrestStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, &self.client.url(&format!("/rest/v1/{}", table)))
    }

    fn upsert_request(&self, table: &str, conflict_column: &str, row: &Row) -> RequestBuilder {
        self.table(Method::POST, table)
            .query(&[("on_conflict", conflict_column)])
            .header(PREFER, "resolution=merge-duplicates,return=minimal")
            .json(row)
    }

    fn select_request(&self, table: &str, filter: &Filter) -> RequestBuilder {
        self.table(Method::GET, table)
            .query(&[("select", "*".to_string()), ("limit", "1".to_string())])
            .query(&[eq_param(filter)])
    }

    fn update_request(&self, table: &str, filter: &Filter, patch: &Row) -> RequestBuilder {
        self.table(Method::PATCH, table)
            .query(&[eq_param(filter)])
            .query(&[("select", eq_param(filter).0)])
            .header(PREFER, "return=representation")
            .json(patch)
    }

    fn insert_request(&self, table: &str, row: &Row) -> RequestBuilder {
        self.table(Method::POST, table)
            .header(PREFER, "return=representation")
            .json(row)
    }

    fn delete_request(&self, table: &str, filter: &Filter) -> RequestBuilder {
        self.table(Method::DELETE, table).query(&[eq_param(filter)])
    }
}

#[async_trait]
impl RowStore for PostgrestStore {
    async fn upsert(&self, table: &str, conflict_column: &str, row: Row) -> Result<()> {
        self.client
            .send(self.upsert_request(table, conflict_column, &row))
            .await?;
        trace!(table, conflict_column, "upserted row");
        Ok(())
    }

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>> {
        let rows: Vec<Row> = self.client.send_json(self.select_request(table, filter)).await?;
        Ok(rows.into_iter().next())
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<usize> {
        let rows: Vec<Row> = self
            .client
            .send_json(self.update_request(table, filter, &patch))
            .await?;
        trace!(table, column = %filter.column, matched = rows.len(), "updated rows");
        Ok(rows.len())
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row> {
        let rows: Vec<Row> = self.client.send_json(self.insert_request(table, &row)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("insert into {} returned no row", table))
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<()> {
        self.client
            .send(self.delete_request(table, filter))
            .await?;
        trace!(table, column = %filter.column, "deleted rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> PostgrestStore {
        PostgrestStore::new(Client::new("https://demo.supabase.co", "anon").unwrap())
    }

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_upsert_request() {
        let request = store()
            .upsert_request("static_content", "key", &row(json!({"key": "hero", "content": "u"})))
            .build()
            .unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.url().path(), "/rest/v1/static_content");
        assert_eq!(request.url().query(), Some("on_conflict=key"));
        assert_eq!(request.headers()[PREFER], "resolution=merge-duplicates,return=minimal");
    }

    #[test]
    fn test_select_request_filters_by_equality() {
        let request = store()
            .select_request("products", &Filter::eq("id", 12))
            .build()
            .unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.url().query(), Some("select=*&limit=1&id=eq.12"));
    }

    #[test]
    fn test_filter_values_are_encoded() {
        let request = store()
            .update_request("static_content", &Filter::eq("key", "a&b c"), &Row::new())
            .build()
            .unwrap();
        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(request.url().query(), Some("key=eq.a%26b+c&select=key"));
    }

    #[test]
    fn test_update_returns_matched_rows() {
        let request = store()
            .update_request("products", &Filter::eq("id", "4"), &row(json!({"image_url": "u"})))
            .build()
            .unwrap();
        assert_eq!(request.headers()[PREFER], "return=representation");
        assert_eq!(request.url().query(), Some("id=eq.4&select=id"));
    }

    #[test]
    fn test_insert_asks_for_representation() {
        let request = store()
            .insert_request("products", &row(json!({"title": "Pouf"})))
            .build()
            .unwrap();
        assert_eq!(request.headers()[PREFER], "return=representation");
    }

    #[test]
    fn test_delete_request() {
        let request = store()
            .delete_request("products", &Filter::eq("id", "7"))
            .build()
            .unwrap();
        assert_eq!(request.method(), &Method::DELETE);
        assert_eq!(request.url().query(), Some("id=eq.7"));
    }
}
