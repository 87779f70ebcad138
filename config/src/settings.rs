//! Application settings management

use crate::{PathManager, crypto};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Replacement policy knobs, stored under `[upload]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Delete the superseded blob after a successful pointer write
    pub cleanup_old_asset: bool,
    /// Delete the freshly uploaded blob when the pointer write fails
    pub compensate_orphaned_upload: bool,
    /// Serialize replacements that target the same image key
    pub serialize_per_key: bool,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            cleanup_old_asset: true,
            compensate_orphaned_upload: true,
            serialize_per_key: true,
        }
    }
}

/// Application settings stored in settings.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Project base URL, e.g. "https://xyz.supabase.co"
    pub project_url: Option<String>,
    /// Email used to sign in as the site administrator
    pub user_email: Option<String>,
    /// Encrypted project API key (see [`crypto::seal_secret`])
    pub api_key: Option<String>,
    /// Storage bucket holding site and product images
    pub bucket: String,
    /// Table mapping content slot keys to text or image URLs
    pub content_table: String,
    pub products_table: String,
    pub profiles_table: String,
    pub upload: UploadSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_url: None,
            user_email: None,
            api_key: None,
            bucket: "images".to_string(),
            content_table: "static_content".to_string(),
            products_table: "products".to_string(),
            profiles_table: "profiles".to_string(),
            upload: UploadSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        match PathManager::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from an explicit path. A missing or unreadable file
    /// yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&content).unwrap_or_default()
    }

    /// Save settings to the settings file
    pub fn save(&self) -> Result<(), String> {
        let path = PathManager::settings_path().ok_or("Could not determine settings path")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config dir: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        fs::write(path, content).map_err(|e| format!("Failed to write settings: {}", e))
    }

    /// Get the decrypted API key.
    /// Returns None if not set or decryption fails.
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .and_then(|sealed| crypto::open_secret(sealed).ok())
    }

    /// Set the API key (encrypts before storing).
    pub fn set_api_key(&mut self, api_key: &str) -> Result<(), String> {
        self.api_key = Some(crypto::seal_secret(api_key)?);
        Ok(())
    }

    pub fn clear_api_key(&mut self) {
        self.api_key = None;
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}
