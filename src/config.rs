//! Application configuration
//!
//! Defaults come from the `config.toml` embedded at build time. The
//! settings file and environment can override the hotkey and dev mode.

use crate::error::AppError;
use crate::settings::SettingsStore;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_TOML: &str = include_str!("../config.toml");

/// Environment switch forcing dev mode
const DEV_MODE_ENV: &str = "PAUSESCAN_DEV";

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Config {
    pub hotkey: HotkeyConfig,
    pub ocr: OcrConfig,
    pub controller: ControllerConfig,
    pub dev: DevConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HotkeyConfig {
    pub accelerator: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OcrConfig {
    pub endpoint: String,
    pub target_height: u32,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ControllerConfig {
    pub step_timeout_secs: u64,
}

impl ControllerConfig {
    pub(crate) fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_secs > 0).then(|| Duration::from_secs(self.step_timeout_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DevConfig {
    pub enabled: bool,
    pub fixtures_dir: PathBuf,
    pub fixture_pid: u32,
    pub ocr_cache: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoggingConfig {
    pub level: String,
}

/// Parse the embedded configuration
pub(crate) fn load_config() -> Result<Config, AppError> {
    parse_config(CONFIG_TOML)
}

fn parse_config(source: &str) -> Result<Config, AppError> {
    let config: Config = toml::from_str(source).map_err(|e| AppError::Config(e.to_string()))?;
    if config.ocr.target_height == 0 {
        return Err(AppError::Config("ocr.target_height must be positive".into()));
    }
    Ok(config)
}

impl Config {
    /// Fold in user overrides. Precedence: CLI flag, environment, settings file, config.toml.
    pub(crate) fn apply_overrides(&mut self, settings: &SettingsStore, dev_flag: bool) {
        if let Some(hotkey) = settings.hotkey() {
            self.hotkey.accelerator = hotkey;
        }
        if let Some(dev) = settings.dev_mode() {
            self.dev.enabled = dev;
        }
        if let Some(dev) = env_flag(DEV_MODE_ENV) {
            self.dev.enabled = dev;
        }
        if dev_flag {
            self.dev.enabled = true;
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
