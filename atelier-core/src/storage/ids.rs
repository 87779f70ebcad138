//! Type-safe identifier newtypes
//!
//! Keys come from page markup or from row-store rows, so they wrap the
//! string form the stores use rather than generating their own values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }
    };
}

define_id!(SlotKey, "Content slot key (a named image or text placement, e.g. `home_hero_image`)");
define_id!(ProductId, "Catalog row identifier");
define_id!(UserId, "Authenticated user identifier");

impl ProductId {
    /// Read an id out of a row value. Rows may carry numeric or text ids.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

/// The logical key an image is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageKey {
    Slot(SlotKey),
    Product(ProductId),
}

impl ImageKey {
    pub fn slot(key: impl Into<String>) -> Self {
        Self::Slot(SlotKey::from_string(key))
    }

    pub fn product(id: impl Into<String>) -> Self {
        Self::Product(ProductId::from_string(id))
    }

    /// Leading part of object names uploaded for this key
    pub fn file_prefix(&self) -> String {
        match self {
            Self::Slot(key) => key.to_string(),
            Self::Product(id) => format!("product_{}", id),
        }
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot(key) => write!(f, "slot:{}", key),
            Self::Product(id) => write!(f, "product:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_id_from_value() {
        assert_eq!(ProductId::from_value(&json!(42)).unwrap().as_str(), "42");
        assert_eq!(ProductId::from_value(&json!("a1")).unwrap().as_str(), "a1");
        assert!(ProductId::from_value(&json!(null)).is_none());
    }

    #[test]
    fn test_image_key_prefix_and_display() {
        let slot = ImageKey::slot("home_hero_image");
        assert_eq!(slot.file_prefix(), "home_hero_image");
        assert_eq!(slot.to_string(), "slot:home_hero_image");

        let product = ImageKey::product("7");
        assert_eq!(product.file_prefix(), "product_7");
        assert_eq!(product.to_string(), "product:7");
    }
}
