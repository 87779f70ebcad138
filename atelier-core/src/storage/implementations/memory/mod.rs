//! In-memory storage implementations
//!
//! These implementations keep data in process memory and are useful for unit
//! tests and for dry runs that should not touch the hosted project.

mod blob;
mod row;
mod session;

pub use blob::MemoryBlobStore;
pub use row::MemoryRowStore;
pub use session::MemorySession;

use crate::storage::traits::StorageTypes;

/// Storage configuration backed entirely by memory stores
pub struct MemoryStorage;

impl StorageTypes for MemoryStorage {
    type Blob = MemoryBlobStore;
    type Rows = MemoryRowStore;
}
