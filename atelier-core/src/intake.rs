//! Drop and file-pick gestures
//!
//! [`ImageDropHandler`] is what an editable image hands its gesture to. It
//! picks the file, filters out anything that is not an image, checks the
//! admin gate and then starts exactly one replacement.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::auth::{AdminGate, GateError};
use crate::display::DisplaySlot;
use crate::notify::Notice;
use crate::replace::{ImageReplacer, PendingUpload, ReplaceError, ReplaceOutcome};
use crate::storage::ids::ImageKey;
use crate::storage::traits::StorageTypes;
use crate::storage::types::RawImage;

/// Message shown when the dropped file is not an image
pub const NOT_AN_IMAGE: &str = "Please select an image file";

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("no file in the gesture")]
    NoFile,
    #[error("'{0}' is not an image type")]
    NotAnImage(String),
    #[error(transparent)]
    Unauthorized(#[from] GateError),
    #[error(transparent)]
    Replace(#[from] ReplaceError),
}

pub struct ImageDropHandler<S: StorageTypes> {
    replacer: Arc<ImageReplacer<S>>,
    gate: Option<Arc<AdminGate<S::Rows>>>,
}

impl<S: StorageTypes> ImageDropHandler<S> {
    pub fn new(replacer: Arc<ImageReplacer<S>>) -> Self {
        Self { replacer, gate: None }
    }

    /// Require the admin gate to pass before each replacement
    pub fn with_gate(mut self, gate: Arc<AdminGate<S::Rows>>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Handle one gesture carrying `files`, aimed at `target` shown in `slot`.
    ///
    /// Only the first file is used.
    pub async fn handle(
        &self,
        files: Vec<RawImage>,
        target: ImageKey,
        slot: Arc<dyn DisplaySlot>,
    ) -> Result<ReplaceOutcome, IntakeError> {
        let Some(source) = files.into_iter().next() else {
            debug!(key = %target, "gesture carried no file");
            return Err(IntakeError::NoFile);
        };

        if !source.is_declared_image() {
            self.replacer.notifier().notify(Notice::error(NOT_AN_IMAGE));
            return Err(IntakeError::NotAnImage(source.mime_type));
        }

        if let Some(gate) = &self.gate {
            if let Err(err) = gate.authorize().await {
                self.replacer.notifier().notify(Notice::error(err.to_string()));
                return Err(err.into());
            }
        }

        debug!(key = %target, file = ?source.name, size = source.size_bytes(), "starting replacement");
        let outcome = self
            .replacer
            .replace_image(PendingUpload { source, target, slot })
            .await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MemorySlot;
    use crate::notify::RecordingNotifier;
    use crate::storage::ids::UserId;
    use crate::storage::implementations::memory::MemorySession;
    use crate::storage::implementations::mock::{MockBlobStore, MockRowStore, MockStorage};
    use crate::storage::pointers::{StoreLayout, to_row};
    use crate::storage::types::AuthUser;
    use crate::transcode::{ImageTranscoder, TranscodeError, TranscodedImage};
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedTranscoder;

    #[async_trait]
    impl ImageTranscoder for FixedTranscoder {
        async fn compress(&self, _file: &RawImage) -> Result<TranscodedImage, TranscodeError> {
            Ok(TranscodedImage {
                bytes: vec![1, 2, 3],
                width: 10,
                height: 10,
            })
        }
    }

    struct Setup {
        blobs: Arc<MockBlobStore>,
        rows: Arc<MockRowStore>,
        notices: Arc<RecordingNotifier>,
        handler: ImageDropHandler<MockStorage>,
    }

    fn setup() -> Setup {
        let blobs = Arc::new(MockBlobStore::new());
        let rows = Arc::new(MockRowStore::new());
        let notices = Arc::new(RecordingNotifier::new());
        let replacer = ImageReplacer::<MockStorage>::new(blobs.clone(), rows.clone(), StoreLayout::default())
            .with_transcoder(Arc::new(FixedTranscoder))
            .with_notifier(notices.clone());
        Setup {
            blobs,
            rows,
            notices,
            handler: ImageDropHandler::new(Arc::new(replacer)),
        }
    }

    fn slot() -> Arc<dyn DisplaySlot> {
        Arc::new(MemorySlot::new())
    }

    #[tokio::test]
    async fn test_first_image_is_replaced() {
        let s = setup();
        let files = vec![
            RawImage::new("image/jpeg", vec![0xff]).with_name("a.jpg"),
            RawImage::new("image/png", vec![0x89]).with_name("b.png"),
        ];
        let outcome = s
            .handler
            .handle(files, ImageKey::slot("about_image"), slot())
            .await
            .unwrap();

        assert!(outcome.object_name.starts_with("about_image_"));
        assert_eq!(s.blobs.upload_calls(), 1);
    }

    #[tokio::test]
    async fn test_non_image_never_reaches_stores() {
        let s = setup();
        let err = s
            .handler
            .handle(
                vec![RawImage::new("application/pdf", b"%PDF".to_vec())],
                ImageKey::slot("about_image"),
                slot(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::NotAnImage(ref t) if t == "application/pdf"));
        assert_eq!(s.blobs.calls(), 0);
        assert_eq!(s.rows.calls(), 0);
        assert_eq!(s.notices.errors(), vec![NOT_AN_IMAGE.to_string()]);
    }

    #[tokio::test]
    async fn test_empty_gesture_is_ignored() {
        let s = setup();
        let err = s
            .handler
            .handle(Vec::new(), ImageKey::slot("about_image"), slot())
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::NoFile));
        assert!(s.notices.notices().is_empty());
    }

    #[tokio::test]
    async fn test_gate_refusal_stops_before_upload() {
        let s = setup();
        s.rows
            .memory()
            .seed("profiles", to_row(json!({"id": "u1", "role": "customer"})));
        let session = MemorySession::signed_in(AuthUser {
            id: UserId::from_string("u1"),
            email: None,
        });
        let gate = Arc::new(AdminGate::new(Arc::new(session), s.rows.clone(), "profiles"));
        let handler = s.handler.with_gate(gate);

        let err = handler
            .handle(
                vec![RawImage::new("image/png", vec![0x89])],
                ImageKey::product("9"),
                slot(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::Unauthorized(GateError::NotAdmin { .. })));
        assert_eq!(s.blobs.calls(), 0);
        assert_eq!(s.notices.errors().len(), 1);
    }
}
