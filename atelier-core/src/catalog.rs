//! Catalog operations of the admin pages: products and text content slots

use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::replace::{BoxError, ReplacePolicy};
use crate::storage::helper::{named_upload, object_name_from_url};
use crate::storage::ids::{ProductId, SlotKey};
use crate::storage::pointers::{StoreLayout, to_row};
use crate::storage::traits::{BlobStore, RowStore, StorageTypes};
use crate::storage::types::{CompressedAsset, Filter, RawImage, Row};
use crate::transcode::{ImageTranscoder, TranscodeError, WebpTranscoder};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("image could not be converted: {0}")]
    Transcode(#[from] TranscodeError),
    #[error("image upload failed: {0}")]
    Upload(#[source] BoxError),
    #[error("row store request failed: {0}")]
    Rows(#[source] BoxError),
    #[error("product {0} not found")]
    NotFound(ProductId),
    #[error("'{0}' is not a valid price")]
    InvalidPrice(String),
    #[error("unknown product field '{0}'")]
    UnknownField(String),
    #[error("the store returned a product row without an id")]
    MalformedRow,
}

fn rows_error(err: anyhow::Error) -> CatalogError {
    CatalogError::Rows(err.into())
}

/// Fields of a product to be created
#[derive(Clone, Debug, Default)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
}

/// A row of the products table
#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl Product {
    pub fn from_row(row: &Row) -> Option<Self> {
        let text = |column: &str| row.get(column).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            id: ProductId::from_value(row.get("id")?)?,
            title: text("title").unwrap_or_default(),
            description: text("description"),
            price: row.get("price").and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            }),
            category: text("category"),
            image_url: text("image_url"),
        })
    }
}

/// Product columns editable in place
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductField {
    Title,
    Description,
    Price,
    Category,
}

impl ProductField {
    pub fn parse(name: &str) -> Result<Self, CatalogError> {
        match name {
            "title" => Ok(Self::Title),
            "description" => Ok(Self::Description),
            "price" => Ok(Self::Price),
            "category" => Ok(Self::Category),
            other => Err(CatalogError::UnknownField(other.to_string())),
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Price => "price",
            Self::Category => "category",
        }
    }
}

/// Parse an edited price such as `"1 250,50 €"`
pub fn parse_price(raw: &str) -> Result<f64, CatalogError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '€' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .ok_or_else(|| CatalogError::InvalidPrice(raw.to_string()))
}

pub struct Catalog<S: StorageTypes> {
    blobs: Arc<S::Blob>,
    rows: Arc<S::Rows>,
    transcoder: Arc<dyn ImageTranscoder>,
    layout: StoreLayout,
    policy: ReplacePolicy,
}

impl<S: StorageTypes> Catalog<S> {
    pub fn new(blobs: Arc<S::Blob>, rows: Arc<S::Rows>, layout: StoreLayout) -> Self {
        Self {
            blobs,
            rows,
            transcoder: Arc::new(WebpTranscoder::new()),
            layout,
            policy: ReplacePolicy::default(),
        }
    }

    pub fn with_transcoder(mut self, transcoder: Arc<dyn ImageTranscoder>) -> Self {
        self.transcoder = transcoder;
        self
    }

    pub fn with_policy(mut self, policy: ReplacePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Insert a product, uploading its image first when one is given
    pub async fn create_product(&self, product: NewProduct, image: Option<RawImage>) -> Result<Product, CatalogError> {
        let uploaded = match image {
            Some(image) => Some(self.upload_new_image(&image).await?),
            None => None,
        };

        let row = to_row(json!({
            "title": product.title,
            "description": product.description,
            "price": product.price,
            "category": product.category,
            "image_url": uploaded.as_ref().map(|(_, url)| url),
        }));

        let inserted = match self.rows.insert(&self.layout.products_table, row).await {
            Ok(inserted) => inserted,
            Err(err) => {
                if let Some((name, _)) = &uploaded {
                    if self.policy.compensate_orphaned_upload {
                        self.remove_blob(name).await;
                    }
                }
                return Err(rows_error(err));
            }
        };

        let created = Product::from_row(&inserted).ok_or(CatalogError::MalformedRow)?;
        info!(product = %created.id, title = %created.title, "product created");
        Ok(created)
    }

    /// Remove a product row and, best-effort, its image
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError> {
        let table = self.layout.products_table.as_str();
        let filter = Filter::eq("id", id.as_str());

        let row = self
            .rows
            .select_one(table, &filter)
            .await
            .map_err(rows_error)?
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        let image_url = row.get("image_url").and_then(Value::as_str);
        if let Some(name) = image_url.and_then(|url| object_name_from_url(url, &self.layout.bucket)) {
            self.remove_blob(&name).await;
        }

        self.rows.delete(table, &filter).await.map_err(rows_error)?;
        info!(product = %id, "product deleted");
        Ok(())
    }

    /// Save an in-place edit of one product column
    pub async fn update_product_field(&self, id: &ProductId, field: ProductField, raw_value: &str) -> Result<(), CatalogError> {
        let value = match field {
            ProductField::Price => json!(parse_price(raw_value)?),
            _ => json!(raw_value.trim()),
        };

        let mut patch = Row::new();
        patch.insert(field.column().to_string(), value);
        let matched = self
            .rows
            .update(&self.layout.products_table, &Filter::eq("id", id.as_str()), patch)
            .await
            .map_err(rows_error)?;
        if matched == 0 {
            return Err(CatalogError::NotFound(id.clone()));
        }
        debug!(product = %id, field = field.column(), "product field saved");
        Ok(())
    }

    /// Save the text of a content slot
    pub async fn save_content(&self, key: &SlotKey, text: &str) -> Result<(), CatalogError> {
        let row = to_row(json!({ "key": key.as_str(), "content": text }));
        self.rows
            .upsert(&self.layout.content_table, "key", row)
            .await
            .map_err(rows_error)?;
        debug!(key = %key, "content saved");
        Ok(())
    }

    async fn upload_new_image(&self, image: &RawImage) -> Result<(String, String), CatalogError> {
        let transcoded = self.transcoder.compress(image).await?;
        let asset = CompressedAsset::named(named_upload("product"), transcoded.bytes, transcoded.width, transcoded.height);
        let bucket = self.layout.bucket.as_str();
        self.blobs
            .upload(bucket, &asset.file_name, &asset.bytes, asset.mime_type)
            .await
            .map_err(|e| CatalogError::Upload(e.into()))?;
        let url = self.blobs.public_url(bucket, &asset.file_name);
        Ok((asset.file_name, url))
    }

    async fn remove_blob(&self, name: &str) {
        if let Err(err) = self.blobs.delete(&self.layout.bucket, &[name.to_string()]).await {
            warn!(object = name, "could not delete product image: {:#}", err);
        }
    }
}
