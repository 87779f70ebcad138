//! Storage type bundle for mock stores

use super::{MockBlobStore, MockRowStore};
use crate::storage::traits::StorageTypes;

pub struct MockStorage;

impl StorageTypes for MockStorage {
    type Blob = MockBlobStore;
    type Rows = MockRowStore;
}
