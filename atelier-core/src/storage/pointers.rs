//! Asset pointers: where each image key's current URL lives in the row store
//!
//! Content slots share the `static_content` table with text slots
//! (`key` → `content`); products carry their URL in `products.image_url`.

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::storage::ids::ImageKey;
use crate::storage::traits::RowStore;
use crate::storage::types::{AssetRecord, Filter, Row};

/// Bucket and table names of one site deployment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreLayout {
    pub bucket: String,
    pub content_table: String,
    pub products_table: String,
    pub profiles_table: String,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            bucket: "images".to_string(),
            content_table: "static_content".to_string(),
            products_table: "products".to_string(),
            profiles_table: "profiles".to_string(),
        }
    }
}

/// Reads and writes [`AssetRecord`]s through a [`RowStore`]
pub struct AssetPointers<R: RowStore> {
    rows: Arc<R>,
    layout: StoreLayout,
}

impl<R: RowStore> AssetPointers<R> {
    pub fn new(rows: Arc<R>, layout: StoreLayout) -> Self {
        Self { rows, layout }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Current URL for `key`, or None when there is no row or no URL
    pub async fn read(&self, key: &ImageKey) -> Result<Option<String>> {
        let (table, filter, column) = self.location(key);
        let row = self
            .rows
            .select_one(table, &filter)
            .await
            .with_context(|| format!("reading image pointer for {}", key))?;
        Ok(row.and_then(|r| r.get(column).and_then(Value::as_str).map(str::to_string)))
    }

    /// Point `record.key` at `record.url`
    pub async fn write(&self, record: &AssetRecord) -> Result<()> {
        match &record.key {
            ImageKey::Slot(key) => {
                let row = to_row(json!({ "key": key.as_str(), "content": record.url }));
                self.rows
                    .upsert(&self.layout.content_table, "key", row)
                    .await
            }
            ImageKey::Product(id) => {
                let patch = to_row(json!({ "image_url": record.url }));
                let matched = self
                    .rows
                    .update(
                        &self.layout.products_table,
                        &Filter::eq("id", id.as_str()),
                        patch,
                    )
                    .await?;
                if matched == 0 {
                    bail!("product {} not found in {}", id, self.layout.products_table);
                }
                Ok(())
            }
        }
    }

    fn location<'a>(&'a self, key: &ImageKey) -> (&'a str, Filter, &'static str) {
        match key {
            ImageKey::Slot(k) => (
                &self.layout.content_table,
                Filter::eq("key", k.as_str()),
                "content",
            ),
            ImageKey::Product(id) => (
                &self.layout.products_table,
                Filter::eq("id", id.as_str()),
                "image_url",
            ),
        }
    }
}

/// Turn a `json!` object literal into a [`Row`]. Non-objects become empty rows.
pub(crate) fn to_row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::implementations::memory::MemoryRowStore;

    fn pointers() -> (Arc<MemoryRowStore>, AssetPointers<MemoryRowStore>) {
        let rows = Arc::new(MemoryRowStore::new());
        (rows.clone(), AssetPointers::new(rows, StoreLayout::default()))
    }

    #[tokio::test]
    async fn test_slot_pointer_roundtrip() {
        let (_, pointers) = pointers();
        let key = ImageKey::slot("home_hero_image");
        assert_eq!(pointers.read(&key).await.unwrap(), None);

        let record = AssetRecord {
            key: key.clone(),
            url: Some("https://x/images/a.webp".to_string()),
        };
        pointers.write(&record).await.unwrap();
        assert_eq!(pointers.read(&key).await.unwrap(), record.url);

        let replaced = AssetRecord {
            key: key.clone(),
            url: Some("https://x/images/b.webp".to_string()),
        };
        pointers.write(&replaced).await.unwrap();
        assert_eq!(pointers.read(&key).await.unwrap(), replaced.url);
    }

    #[tokio::test]
    async fn test_product_pointer_updates_existing_row() {
        let (rows, pointers) = pointers();
        rows.seed("products", to_row(json!({"id": 3, "title": "Chauffeuse", "image_url": null})));

        let key = ImageKey::product("3");
        assert_eq!(pointers.read(&key).await.unwrap(), None);

        pointers
            .write(&AssetRecord {
                key: key.clone(),
                url: Some("https://x/images/p.webp".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(
            pointers.read(&key).await.unwrap().as_deref(),
            Some("https://x/images/p.webp")
        );
        assert_eq!(rows.rows("products")[0]["title"], "Chauffeuse");
    }

    #[tokio::test]
    async fn test_product_pointer_requires_the_product() {
        let (rows, pointers) = pointers();
        let err = pointers
            .write(&AssetRecord {
                key: ImageKey::product("999"),
                url: Some("https://x/images/p.webp".to_string()),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("999"));
        assert!(rows.rows("products").is_empty());
    }
}
