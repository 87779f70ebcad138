//! Image asset types

use crate::storage::helper::object_name_for;
use crate::storage::ids::ImageKey;

/// MIME type of every uploaded image
pub const WEBP_MIME: &str = "image/webp";

/// Raw file as handed over by a drop or file-pick gesture.
#[derive(Clone, Debug)]
pub struct RawImage {
    /// File name as reported by the picker (if known)
    pub name: Option<String>,
    /// Declared MIME type (e.g. "image/png"); not verified against the bytes
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl RawImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: None,
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether the declared type is in the image category
    pub fn is_declared_image(&self) -> bool {
        self.mime_type.to_ascii_lowercase().starts_with("image/")
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Transcoded image ready for upload
#[derive(Clone, Debug)]
pub struct CompressedAsset {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

impl CompressedAsset {
    /// Wrap WebP bytes under a fresh object name derived from `key`
    pub fn for_key(key: &ImageKey, bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self::named(object_name_for(key), bytes, width, height)
    }

    pub fn named(file_name: String, bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            mime_type: WEBP_MIME,
            file_name,
            width,
            height,
        }
    }
}

/// Pointer from a logical key to the public URL of its current image
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetRecord {
    pub key: ImageKey,
    pub url: Option<String>,
}

/// Result of a blob upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub object_name: String,
    pub size: usize,
}
