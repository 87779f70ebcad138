//! Replacement error taxonomy

use thiserror::Error;

use crate::transcode::TranscodeError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal outcomes of a replacement run. The display slot has been restored
/// and the user notified by the time one of these is returned.
#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error("image could not be converted: {0}")]
    TranscodeFailed(#[source] TranscodeError),
    #[error("image upload failed: {0}")]
    UploadFailed(#[source] BoxError),
    #[error("saving the image address failed: {0}")]
    PointerWriteFailed(#[source] BoxError),
}

impl ReplaceError {
    pub(crate) fn upload(err: anyhow::Error) -> Self {
        Self::UploadFailed(err.into())
    }

    pub(crate) fn pointer_write(err: anyhow::Error) -> Self {
        Self::PointerWriteFailed(err.into())
    }
}

/// Best-effort deletion of the superseded blob failed. Logged and reported
/// in the outcome, never returned as an error.
#[derive(Debug, Error)]
#[error("could not delete old image {object_name}: {message}")]
pub struct CleanupError {
    pub object_name: String,
    pub message: String,
}
