//! Display slots: where a replaced image is shown
//!
//! A [`DisplaySlot`] stands for the rendered `<img>` of a content slot or
//! product card. The replacer drives it through the pending, preview and
//! settled states and puts it back exactly as it was when a run fails.

use base64::{Engine, engine::general_purpose::STANDARD};
use std::sync::{Mutex, PoisonError};

use crate::storage::types::RawImage;

/// Visual treatment applied while a replacement is in flight
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Treatment {
    #[default]
    Normal,
    /// Upload started, nothing to show yet
    Pending,
    /// Local preview of the dropped file is showing
    Preview,
}

impl Treatment {
    pub fn opacity(self) -> f32 {
        match self {
            Self::Normal => 1.0,
            Self::Pending => 0.3,
            Self::Preview => 0.5,
        }
    }

    /// Blur radius in CSS pixels
    pub fn blur_px(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::Pending => 4,
            Self::Preview => 2,
        }
    }
}

/// What a slot shows at a point in time
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlotState {
    pub source: Option<String>,
    pub treatment: Treatment,
}

pub trait DisplaySlot: Send + Sync {
    fn state(&self) -> SlotState;

    fn set_source(&self, source: Option<&str>);

    fn set_treatment(&self, treatment: Treatment);

    /// Put the slot back to a previously captured state
    fn restore(&self, state: &SlotState) {
        self.set_source(state.source.as_deref());
        self.set_treatment(state.treatment);
    }
}

/// `data:` URL rendering of a raw file, used for the local preview
pub fn preview_data_url(file: &RawImage) -> String {
    format!("data:{};base64,{}", file.mime_type, STANDARD.encode(&file.bytes))
}

/// Slot that keeps its state and every transition in memory
#[derive(Debug, Default)]
pub struct MemorySlot {
    inner: Mutex<(SlotState, Vec<SlotState>)>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn showing(source: impl Into<String>) -> Self {
        let state = SlotState {
            source: Some(source.into()),
            treatment: Treatment::Normal,
        };
        Self {
            inner: Mutex::new((state, Vec::new())),
        }
    }

    /// Every state the slot has been in after construction, in order
    pub fn history(&self) -> Vec<SlotState> {
        self.lock().1.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, (SlotState, Vec<SlotState>)> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, change: impl FnOnce(&mut SlotState)) {
        let mut inner = self.lock();
        change(&mut inner.0);
        let snapshot = inner.0.clone();
        inner.1.push(snapshot);
    }
}

impl DisplaySlot for MemorySlot {
    fn state(&self) -> SlotState {
        self.lock().0.clone()
    }

    fn set_source(&self, source: Option<&str>) {
        self.apply(|s| s.source = source.map(str::to_string));
    }

    fn set_treatment(&self, treatment: Treatment) {
        self.apply(|s| s.treatment = treatment);
    }
}
