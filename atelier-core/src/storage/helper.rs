//! Shared utilities for storage implementations

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::storage::ids::ImageKey;

/// Current unix timestamp in milliseconds (0 if the clock is before the epoch)
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Object name for a new upload: `<prefix>_<millis>_<uuid>.webp`.
///
/// The uuid keeps two uploads for the same key within one millisecond apart.
pub fn object_name_for(key: &ImageKey) -> String {
    named_upload(&key.file_prefix())
}

/// Object name for an upload that has no key yet (a product being created).
pub fn named_upload(prefix: &str) -> String {
    format!("{}_{}_{}.webp", prefix, unix_timestamp(), Uuid::new_v4().simple())
}

/// Recover the object name from a public URL of `bucket`.
///
/// Takes whatever follows the last `/<bucket>/` segment, without query string
/// or fragment. Returns None for URLs that do not point into the bucket.
pub fn object_name_from_url(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/{}/", bucket);
    let start = url.rfind(&marker)? + marker.len();
    let tail = &url[start..];
    let end = tail.find(['?', '#']).unwrap_or(tail.len());
    let name = &tail[..end];
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_name_shape() {
        let name = object_name_for(&ImageKey::slot("home_hero_image"));
        assert!(name.starts_with("home_hero_image_"));
        assert!(name.ends_with(".webp"));

        let product = object_name_for(&ImageKey::product("12"));
        assert!(product.starts_with("product_12_"));
    }

    #[test]
    fn test_object_names_unique_within_same_millisecond() {
        let key = ImageKey::slot("cat_fauteuils");
        let names: std::collections::HashSet<_> = (0..64).map(|_| object_name_for(&key)).collect();
        assert_eq!(names.len(), 64);
    }

    #[test]
    fn test_object_name_from_url() {
        let url = "https://demo.supabase.co/storage/v1/object/public/images/hero_1_abc.webp";
        assert_eq!(
            object_name_from_url(url, "images").as_deref(),
            Some("hero_1_abc.webp")
        );
        assert_eq!(
            object_name_from_url("https://x/images/a.webp?v=2", "images").as_deref(),
            Some("a.webp")
        );
        assert_eq!(object_name_from_url("https://cdn.example.com/a.webp", "images"), None);
        assert_eq!(object_name_from_url("https://x/images/", "images"), None);
    }
}
