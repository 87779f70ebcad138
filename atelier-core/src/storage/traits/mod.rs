//! Storage trait definitions
//!
//! All storage traits are defined here, with implementations in `implementations/`
//! and in the provider crate.

mod blob;
mod row;
mod session;

pub use blob::BlobStore;
pub use row::RowStore;
pub use session::SessionProvider;

/// Bundles the store type associations into a single trait.
///
/// ```ignore
/// pub struct Hosted;
///
/// impl StorageTypes for Hosted {
///     type Blob = SupabaseBlobStore;
///     type Rows = PostgrestStore;
/// }
///
/// type HostedReplacer = ImageReplacer<Hosted>;
/// ```
pub trait StorageTypes: Send + Sync + 'static {
    /// Object storage holding image bytes
    type Blob: BlobStore + Send + Sync;
    /// Row storage holding the pointers
    type Rows: RowStore + Send + Sync;
}
