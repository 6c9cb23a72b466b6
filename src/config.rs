//! Configuration loading
//!
//! Resolution order:
//! 1. Built-in defaults
//! 2. TOML config file (`MAGIC_SHUTTER_CONFIG`, else `<config_dir>/magic-shutter/config.toml`)
//! 3. Environment variables (`GEMINI_API_KEY`, `API_KEY`, `MAGIC_SHUTTER_LOCALE`)

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::{CaptureRequest, Facing};
use crate::error::ConfigError;

/// Locale used for analysis prompts, fallbacks and UI labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en", alias = "en-US")]
    English,
    #[serde(rename = "zh-CN", alias = "zh")]
    SimplifiedChinese,
}

impl Locale {
    /// Parse a locale tag from the environment
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en_us" => Some(Locale::English),
            "zh" | "zh-cn" | "zh_cn" => Some(Locale::SimplifiedChinese),
            _ => None,
        }
    }
}

/// Camera request settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Index of the video device (`/dev/videoN` on Linux)
    pub device_index: usize,
    /// Preferred camera facing
    pub facing: Facing,
    /// Ideal capture width in pixels
    pub ideal_width: u32,
    /// Ideal capture height in pixels
    pub ideal_height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            facing: Facing::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Captioning service credential; absent means analysis falls back
    pub api_key: Option<String>,
    /// Captioning model name
    pub model: String,
    /// Base URL of the captioning service
    pub endpoint: String,
    pub locale: Locale,
    /// Upper bound on a single analysis request
    pub request_timeout_secs: u64,
    /// Length of the fake "developing" phase
    pub processing_delay_ms: u64,
    /// Length of the shutter flash
    pub flash_duration_ms: u64,
    /// Taps on the gallery button that return to setup
    pub hidden_reset_taps: u32,
    /// Link appended to shared text
    pub share_url: Option<String>,
    pub camera: CameraConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            locale: Locale::English,
            request_timeout_secs: 30,
            processing_delay_ms: 1500,
            flash_duration_ms: 150,
            hidden_reset_taps: 3,
            share_url: None,
            camera: CameraConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the config file and the process environment
    ///
    /// A missing config file is not an error; a broken one is.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Like [`Config::load`], but a broken config file only costs a warning
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "⚠️  Config unusable, using defaults");
            let mut config = Self::default();
            config.apply_env(|key| std::env::var(key).ok());
            config
        })
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    fn from_toml(content: &str) -> Result<Self, String> {
        let mut config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
        config.api_key = normalize_key(config.api_key);
        Ok(config)
    }

    /// Apply environment overrides using `lookup` as the variable source
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = normalize_key(lookup("GEMINI_API_KEY"))
            .or_else(|| normalize_key(lookup("API_KEY")))
        {
            self.api_key = Some(key);
        }

        if let Some(tag) = lookup("MAGIC_SHUTTER_LOCALE") {
            match Locale::from_tag(&tag) {
                Some(locale) => self.locale = locale,
                None => tracing::warn!(tag = %tag, "Ignoring unknown locale"),
            }
        }
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Camera request built from the `[camera]` section
    pub fn capture_request(&self) -> CaptureRequest {
        CaptureRequest {
            device_index: self.camera.device_index,
            facing: self.camera.facing,
            ideal_width: self.camera.ideal_width,
            ideal_height: self.camera.ideal_height,
        }
    }
}

/// Blank credentials count as missing
fn normalize_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

/// Get the config file path for this platform
fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("MAGIC_SHUTTER_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let mut path = dirs::config_dir()?;
    path.push("magic-shutter");
    path.push("config.toml");
    Some(path)
}
