//! User settings storage
//!
//! Handles saving and loading user settings to a JSON file in the
//! application config directory. The file is re-read on every access so
//! edits made from another surface (the `set-api-key` command, a text
//! editor) are picked up without restarting the session.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Key under which the OCR credential is persisted
pub(crate) const GOOGLE_CLOUD_API_KEY: &str = "google_cloud_api_key";

/// Environment override for the stored credential
const API_KEY_ENV: &str = "GOOGLE_CLOUD_API_KEY";

/// Persisted user settings
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Settings {
    /// Google Cloud Vision API key
    #[serde(rename = "google_cloud_api_key", skip_serializing_if = "Option::is_none")]
    pub google_cloud_api_key: Option<String>,
    /// Hotkey accelerator override (e.g. "alt+KeyP")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    /// Force fixture gateways on or off regardless of config.toml
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_mode: Option<bool>,
}

/// Handle on the settings file
#[derive(Debug, Clone)]
pub(crate) struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Settings file in the platform config directory
    pub(crate) fn open_default() -> Result<Self, SettingsError> {
        settings_path()
            .map(Self::new)
            .ok_or(SettingsError::NoConfigDir)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings from disk
    ///
    /// Returns default settings if the file doesn't exist or can't be read
    pub(crate) fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }

        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    error!("Failed to parse settings: {}", e);
                    Settings::default()
                }
            },
            Err(e) => {
                error!("Failed to read settings file: {}", e);
                Settings::default()
            }
        }
    }

    /// Save settings to disk
    pub(crate) fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                info!("Created settings directory: {:?}", parent);
            }
        }

        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        info!("Saved settings to: {:?}", self.path);

        Ok(())
    }

    /// Current API key: environment first, then a fresh read of the file
    pub(crate) fn google_cloud_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .or_else(|| self.load().google_cloud_api_key)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Store the API key and confirm it reads back
    pub(crate) fn set_google_cloud_api_key(&self, key: Option<&str>) -> Result<(), SettingsError> {
        let key = key.map(str::trim).filter(|k| !k.is_empty());

        let mut settings = self.load();
        settings.google_cloud_api_key = key.map(str::to_string);
        self.save(&settings)?;

        if self.load().google_cloud_api_key.as_deref() != key {
            return Err(SettingsError::NotPersisted(GOOGLE_CLOUD_API_KEY));
        }
        Ok(())
    }

    pub(crate) fn hotkey(&self) -> Option<String> {
        self.load().hotkey.filter(|h| !h.is_empty())
    }

    pub(crate) fn dev_mode(&self) -> Option<bool> {
        self.load().dev_mode
    }
}

/// Get the settings file path
fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("PauseScan").join("settings.json"))
}

/// Mask a secret for display, keeping the last four characters
pub(crate) fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
