//! Replacement policy

/// How a replacement treats the blobs around the pointer write
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplacePolicy {
    /// After a successful pointer write, delete the blob the old URL named.
    /// Applies to content slots and products alike.
    pub cleanup_old_asset: bool,
    /// When the pointer write fails, delete the blob that was just uploaded
    pub compensate_orphaned_upload: bool,
    /// Run replacements for the same key one after another
    pub serialize_per_key: bool,
}

impl Default for ReplacePolicy {
    fn default() -> Self {
        Self {
            cleanup_old_asset: true,
            compensate_orphaned_upload: true,
            serialize_per_key: true,
        }
    }
}
