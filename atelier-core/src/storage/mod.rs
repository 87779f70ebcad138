//! Storage abstractions for images and their pointers
//!
//! - `traits` - `BlobStore`, `RowStore` and `SessionProvider`, plus the
//!   `StorageTypes` bundle the workflow is generic over
//! - `types` - records passed across the traits
//! - `pointers` - where each image key's URL lives in the row store
//! - `implementations` - memory and mock stores

pub mod helper;
pub mod ids;
pub mod implementations;
pub mod pointers;
pub mod traits;
pub mod types;

pub use ids::{ImageKey, ProductId, SlotKey, UserId};
pub use implementations::memory::{MemoryBlobStore, MemoryRowStore, MemorySession, MemoryStorage};
pub use pointers::{AssetPointers, StoreLayout};
pub use traits::{BlobStore, RowStore, SessionProvider, StorageTypes};
pub use types::{AssetRecord, AuthUser, CompressedAsset, Filter, RawImage, Role, Row, StoredObject};
