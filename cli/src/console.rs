//! Terminal stand-ins for the page's image element and alert box

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use atelier_core::storage::RawImage;
use atelier_core::{DisplaySlot, Notice, NoticeLevel, Notifier, SlotState, Treatment};
use tracing::{debug, info};

/// Longest source shown in full; `data:` previews are cut to this
const SHOWN_SOURCE_LEN: usize = 72;

fn shorten(source: &str) -> String {
    if source.len() <= SHOWN_SOURCE_LEN {
        return source.to_string();
    }
    let cut = (0..=SHOWN_SOURCE_LEN)
        .rev()
        .find(|i| source.is_char_boundary(*i))
        .unwrap_or(0);
    format!("{}... ({} bytes)", &source[..cut], source.len())
}

/// Display slot that logs every transition
pub struct ConsoleSlot {
    label: String,
    state: Mutex<SlotState>,
}

impl ConsoleSlot {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: Mutex::new(SlotState::default()),
        }
    }
}

impl DisplaySlot for ConsoleSlot {
    fn state(&self) -> SlotState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_source(&self, source: Option<&str>) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).source = source.map(str::to_string);
        info!(slot = %self.label, source = %source.map(shorten).unwrap_or_default(), "slot source");
    }

    fn set_treatment(&self, treatment: Treatment) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).treatment = treatment;
        debug!(
            slot = %self.label,
            ?treatment,
            opacity = treatment.opacity(),
            blur_px = treatment.blur_px(),
            "slot treatment"
        );
    }
}

/// Prints notices to stderr
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => eprintln!("{}", notice.message),
            NoticeLevel::Error => eprintln!("Error: {}", notice.message),
        }
    }
}

/// Read a local file as if it had been dropped on the page
pub async fn read_image(path: &Path) -> anyhow::Result<RawImage> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let image = RawImage::new(mime.essence_str(), bytes);
    Ok(match path.file_name() {
        Some(name) => image.with_name(name.to_string_lossy()),
        None => image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_keeps_short_urls() {
        let url = "https://demo.supabase.co/storage/v1/object/public/images/a.webp";
        assert_eq!(shorten(url), url);

        let preview = format!("data:image/png;base64,{}", "A".repeat(500));
        let shown = shorten(&preview);
        assert!(shown.starts_with("data:image/png;base64,AAAA"));
        assert!(shown.ends_with(&format!("({} bytes)", preview.len())));
    }

    #[test]
    fn test_console_slot_tracks_state() {
        let slot = ConsoleSlot::new("slot:hero");
        slot.set_treatment(Treatment::Pending);
        slot.set_source(Some("https://x/images/a.webp"));
        assert_eq!(
            slot.state(),
            SlotState {
                source: Some("https://x/images/a.webp".to_string()),
                treatment: Treatment::Pending,
            }
        );
    }

    #[tokio::test]
    async fn test_read_image_guesses_type() {
        let dir = std::env::temp_dir().join("atelier-cli-read-image");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("hero.png");
        tokio::fs::write(&path, [0x89, b'P', b'N', b'G']).await.unwrap();

        let image = read_image(&path).await.unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.name.as_deref(), Some("hero.png"));
        assert!(image.is_declared_image());

        let pdf = dir.join("devis.pdf");
        tokio::fs::write(&pdf, b"%PDF").await.unwrap();
        assert!(!read_image(&pdf).await.unwrap().is_declared_image());
    }
}
