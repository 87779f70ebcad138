//! Mock storage implementations for testing
//!
//! Each mock wraps the matching memory store, records the calls it receives
//! and can be told to fail. `MockRowStore` can also hold pointer writes at a
//! gate so tests can force a particular interleaving of concurrent runs.

mod blob;
mod row;
mod types;

pub use blob::MockBlobStore;
pub use row::MockRowStore;
pub use types::MockStorage;
