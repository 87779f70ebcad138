//! Image replacement workflow for the atelier site
//!
//! This crate provides:
//! - **Transcoding**: `WebpTranscoder` (max 1200px wide, WebP at quality 80)
//! - **Orchestration**: `ImageReplacer` keeps a display slot, a blob and its pointer row consistent
//! - **Intake**: `ImageDropHandler` turns a drop or file pick into one replacement
//! - **Catalog**: product and text content edits
//! - **Storage**: `BlobStore`, `RowStore` and `SessionProvider` traits with memory backends
//!
//! # Example
//!
//! ```ignore
//! use atelier_core::{ImageKey, ImageReplacer, PendingUpload};
//!
//! let replacer = ImageReplacer::<Hosted>::new(blobs, rows, layout);
//! let outcome = replacer
//!     .replace_image(PendingUpload { source, target: ImageKey::slot("home_hero_image"), slot })
//!     .await?;
//! ```
pub mod auth;
pub mod catalog;
pub mod display;
pub mod intake;
pub mod notify;
pub mod replace;
pub mod storage;
pub mod transcode;

pub use auth::{AdminGate, GateError};
pub use catalog::{Catalog, CatalogError, NewProduct, Product, ProductField};
pub use display::{DisplaySlot, MemorySlot, SlotState, Treatment};
pub use intake::{ImageDropHandler, IntakeError};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use replace::{CleanupError, CleanupStatus, ImageReplacer, PendingUpload, ReplaceError, ReplaceOutcome, ReplacePolicy};
pub use storage::{ImageKey, ProductId, SlotKey, StoreLayout};
pub use transcode::{ImageTranscoder, TranscodeError, TranscodedImage, WebpTranscoder};
