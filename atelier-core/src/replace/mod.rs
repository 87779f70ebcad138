//! Image replacement - keeps a display slot, a stored blob and its row-store
//! pointer consistent
//!
//! One run of [`ImageReplacer::replace_image`]:
//!
//! 1. pending treatment, then a local preview of the dropped file
//! 2. read the old pointer (only when cleanup applies)
//! 3. transcode
//! 4. upload the WebP under a fresh object name
//! 5. write the new public URL into the pointer row
//! 6. delete the superseded blob (best-effort)
//! 7. show the new URL
//!
//! A failure in steps 3-5 puts the slot back the way it was, notifies the
//! user and returns the matching [`ReplaceError`]. Nothing after step 5 can
//! fail the run.

mod error;
mod locks;
mod policy;

pub use error::{BoxError, CleanupError, ReplaceError};
pub use locks::KeyLocks;
pub use policy::ReplacePolicy;

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::display::{DisplaySlot, Treatment, preview_data_url};
use crate::notify::{Notice, Notifier, TracingNotifier};
use crate::storage::helper::object_name_from_url;
use crate::storage::ids::ImageKey;
use crate::storage::pointers::{AssetPointers, StoreLayout};
use crate::storage::traits::{BlobStore, StorageTypes};
use crate::storage::types::{AssetRecord, CompressedAsset, RawImage};
use crate::transcode::{ImageTranscoder, WebpTranscoder};

/// A file waiting to replace the image bound to `target`
pub struct PendingUpload {
    pub source: RawImage,
    pub target: ImageKey,
    pub slot: Arc<dyn DisplaySlot>,
}

/// What happened to the blob the new image superseded
#[derive(Debug)]
pub enum CleanupStatus {
    /// Cleanup is switched off by the policy
    Disabled,
    /// No old URL, the same URL, or a URL outside the bucket
    NothingToDelete,
    Deleted(String),
    Failed(CleanupError),
}

#[derive(Debug)]
pub struct ReplaceOutcome {
    pub key: ImageKey,
    /// Public URL now stored in the pointer row and shown in the slot
    pub url: String,
    pub object_name: String,
    /// URL the pointer held before the run, if it was read
    pub previous_url: Option<String>,
    pub cleanup: CleanupStatus,
}

/// Runs image replacements against a blob store and a row store.
///
/// Generic over `S: StorageTypes`, like the rest of the storage layer.
pub struct ImageReplacer<S: StorageTypes> {
    blobs: Arc<S::Blob>,
    pointers: AssetPointers<S::Rows>,
    transcoder: Arc<dyn ImageTranscoder>,
    notifier: Arc<dyn Notifier>,
    policy: ReplacePolicy,
    locks: KeyLocks,
}

impl<S: StorageTypes> ImageReplacer<S> {
    /// Replacer with the WebP transcoder, log-only notices and the default policy
    pub fn new(blobs: Arc<S::Blob>, rows: Arc<S::Rows>, layout: StoreLayout) -> Self {
        Self {
            blobs,
            pointers: AssetPointers::new(rows, layout),
            transcoder: Arc::new(WebpTranscoder::new()),
            notifier: Arc::new(TracingNotifier),
            policy: ReplacePolicy::default(),
            locks: KeyLocks::new(),
        }
    }

    pub fn with_transcoder(mut self, transcoder: Arc<dyn ImageTranscoder>) -> Self {
        self.transcoder = transcoder;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_policy(mut self, policy: ReplacePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ReplacePolicy {
        self.policy
    }

    pub fn layout(&self) -> &StoreLayout {
        self.pointers.layout()
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Replace the image bound to `upload.target` with `upload.source`.
    ///
    /// With `serialize_per_key` on, a second run for the same key waits
    /// here, before touching its slot, until the first has settled.
    pub async fn replace_image(&self, upload: PendingUpload) -> Result<ReplaceOutcome, ReplaceError> {
        let _guard = if self.policy.serialize_per_key {
            Some(self.locks.acquire(&upload.target).await)
        } else {
            None
        };

        let PendingUpload { source, target, slot } = upload;
        let before = slot.state();

        slot.set_treatment(Treatment::Pending);
        slot.set_source(Some(&preview_data_url(&source)));
        slot.set_treatment(Treatment::Preview);

        match self.run(&source, &target).await {
            Ok(outcome) => {
                slot.set_source(Some(&outcome.url));
                slot.set_treatment(Treatment::Normal);
                info!(key = %target, url = %outcome.url, "image replaced");
                Ok(outcome)
            }
            Err(err) => {
                slot.restore(&before);
                error!(key = %target, "image replacement failed: {}", err);
                self.notifier.notify(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    async fn run(&self, source: &RawImage, target: &ImageKey) -> Result<ReplaceOutcome, ReplaceError> {
        let previous_url = if self.policy.cleanup_old_asset {
            self.read_previous(target).await
        } else {
            None
        };

        let transcoded = self
            .transcoder
            .compress(source)
            .await
            .map_err(ReplaceError::TranscodeFailed)?;
        let asset = CompressedAsset::for_key(target, transcoded.bytes, transcoded.width, transcoded.height);
        debug!(
            key = %target,
            object = %asset.file_name,
            size = asset.bytes.len(),
            width = asset.width,
            height = asset.height,
            "transcoded image"
        );

        let bucket = self.layout().bucket.as_str();
        self.blobs
            .upload(bucket, &asset.file_name, &asset.bytes, asset.mime_type)
            .await
            .map_err(ReplaceError::upload)?;
        let url = self.blobs.public_url(bucket, &asset.file_name);

        let record = AssetRecord {
            key: target.clone(),
            url: Some(url.clone()),
        };
        if let Err(err) = self.pointers.write(&record).await {
            if self.policy.compensate_orphaned_upload {
                self.discard_upload(&asset.file_name).await;
            }
            return Err(ReplaceError::pointer_write(err));
        }

        let cleanup = if self.policy.cleanup_old_asset {
            self.cleanup_superseded(previous_url.as_deref(), &url, &asset.file_name)
                .await
        } else {
            CleanupStatus::Disabled
        };

        Ok(ReplaceOutcome {
            key: target.clone(),
            url,
            object_name: asset.file_name,
            previous_url,
            cleanup,
        })
    }

    /// A failed read only costs the cleanup, so it is logged and ignored
    async fn read_previous(&self, target: &ImageKey) -> Option<String> {
        match self.pointers.read(target).await {
            Ok(url) => url,
            Err(err) => {
                warn!(key = %target, "could not read current image pointer: {:#}", err);
                None
            }
        }
    }

    async fn discard_upload(&self, object_name: &str) {
        let bucket = self.layout().bucket.as_str();
        match self.blobs.delete(bucket, &[object_name.to_string()]).await {
            Ok(()) => debug!(object = object_name, "deleted orphaned upload"),
            Err(err) => warn!(object = object_name, "orphaned upload left in storage: {:#}", err),
        }
    }

    async fn cleanup_superseded(&self, previous_url: Option<&str>, new_url: &str, new_object: &str) -> CleanupStatus {
        let Some(previous_url) = previous_url.filter(|u| *u != new_url) else {
            return CleanupStatus::NothingToDelete;
        };
        let bucket = self.layout().bucket.as_str();
        let Some(old_object) = object_name_from_url(previous_url, bucket).filter(|n| n != new_object) else {
            debug!(url = previous_url, "previous image is not in the bucket, keeping it");
            return CleanupStatus::NothingToDelete;
        };

        match self.blobs.delete(bucket, std::slice::from_ref(&old_object)).await {
            Ok(()) => {
                debug!(object = %old_object, "deleted superseded image");
                CleanupStatus::Deleted(old_object)
            }
            Err(err) => {
                let failure = CleanupError {
                    object_name: old_object,
                    message: format!("{:#}", err),
                };
                warn!("{}", failure);
                CleanupStatus::Failed(failure)
            }
        }
    }
}
