//! `config.json` handling
//!
//! The file is created with defaults on first run. Keys missing from an
//! existing file (including keys inside `logging` and `debounce`) take
//! their default values.

use crate::debounce::DebounceConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_LOG_FILE: &str = "zpttlink.log";

fn default_com_port() -> String {
    if cfg!(windows) {
        "COM3".to_string()
    } else {
        "/dev/ttyUSB0".to_string()
    }
}

fn default_hints() -> Vec<String> {
    ["usb", "ttyacm", "ttyusb", "usbmodem", "usbserial", "aioc", "cm108"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DebounceMs {
    pub press_ms: u64,
    pub release_ms: u64,
}

impl Default for DebounceMs {
    fn default() -> Self {
        Self {
            press_ms: 30,
            release_ms: 60,
        }
    }
}

impl From<DebounceMs> for DebounceConfig {
    fn from(ms: DebounceMs) -> Self {
        DebounceConfig::from_millis(ms.press_ms, ms.release_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Serial port; empty means autodetect
    pub com_port: String,
    /// Kept for compatibility with existing files; not used for routing
    pub audio_input: String,
    pub audio_output: String,
    pub ptt_hotkey: String,
    pub logging: LoggingConfig,
    pub debounce: DebounceMs,
    /// Substrings used to rank ports when `com_port` is empty
    pub serial_autodetect_hints: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            com_port: default_com_port(),
            audio_input: "AIOC Microphone".to_string(),
            audio_output: "AIOC Speaker".to_string(),
            ptt_hotkey: "F9".to_string(),
            logging: LoggingConfig::default(),
            debounce: DebounceMs::default(),
            serial_autodetect_hints: default_hints(),
        }
    }
}

/// Result of [`load_or_default`].
#[derive(Debug)]
pub enum ConfigSource {
    /// Read from an existing file
    File,
    /// File did not exist; defaults were written to it
    Created,
    /// File could not be read or parsed; defaults are in use
    Fallback(crate::error::PttError),
}

impl AppConfig {
    /// Parse a config file, filling missing keys with defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn debounce_config(&self) -> DebounceConfig {
        self.debounce.into()
    }
}

/// Load `path`, creating it with defaults if missing.
///
/// Never fails: an unreadable or malformed file yields the defaults, with
/// the error returned alongside so the caller can report it.
pub fn load_or_default(path: &Path) -> (AppConfig, ConfigSource) {
    if !path.exists() {
        let config = AppConfig::default();
        return match config.save(path) {
            Ok(()) => (config, ConfigSource::Created),
            Err(e) => (config, ConfigSource::Fallback(e)),
        };
    }

    match AppConfig::load(path) {
        Ok(config) => (config, ConfigSource::File),
        Err(e) => (AppConfig::default(), ConfigSource::Fallback(e)),
    }
}
