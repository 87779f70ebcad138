//! Storage types
//!
//! Shared types used by storage traits and implementations.

pub mod asset;
pub mod row;
pub mod user;

// Re-exports for convenience
pub use asset::{AssetRecord, CompressedAsset, RawImage, StoredObject};
pub use row::{Filter, Row};
pub use user::{AuthUser, Role};
