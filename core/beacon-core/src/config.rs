//! Configuration loading, validation, and hot reload.
//!
//! The daemon treats this as read-mostly shared state: it is the sole writer
//! (on hot reload) and every other component sees an immutable snapshot for
//! the duration of a cycle. Configuration errors are fatal at load time only;
//! a failed reload keeps the previous configuration.

use crate::error::{BeaconError, Result};
use crate::provider::ProviderKind;
use fs_err as fs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const MIN_UPDATE_INTERVAL: u64 = 15;
pub const MAX_UPDATE_INTERVAL: u64 = 60;

/// Keys shipped in the template config carry this prefix until the user
/// fills them in; they count as missing.
const PLACEHOLDER_PREFIX: &str = "YOUR_";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Identity presented to the presence peer during the handshake.
    pub client_id: String,

    /// API key handed to the configured text provider.
    pub api_key: String,

    #[serde(default)]
    pub provider: ProviderKind,

    /// Empty means the provider's default model.
    #[serde(default)]
    pub model: String,

    /// Poll interval in seconds, clamped to [15, 60] on load.
    #[serde(default = "default_update_interval")]
    pub update_interval: u64,

    #[serde(default = "default_fallback_status")]
    pub fallback_status: String,

    /// Executable name → friendly display name.
    #[serde(default)]
    pub tracked_apps: BTreeMap<String, String>,

    #[serde(default = "default_persona")]
    pub persona: String,

    #[serde(default)]
    pub custom_persona_text: String,

    #[serde(default)]
    pub persona_presets: BTreeMap<String, String>,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub show_button: bool,

    #[serde(default)]
    pub button_label: String,

    #[serde(default)]
    pub button_url: String,

    /// Case-insensitive substrings scrubbed from window titles.
    #[serde(default)]
    pub blacklist: Vec<String>,
}

fn default_update_interval() -> u64 {
    20
}

fn default_fallback_status() -> String {
    "💤 AFK — back soon.".to_string()
}

fn default_persona() -> String {
    "custom".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            api_key: String::new(),
            provider: ProviderKind::default(),
            model: String::new(),
            update_interval: default_update_interval(),
            fallback_status: default_fallback_status(),
            tracked_apps: BTreeMap::new(),
            persona: default_persona(),
            custom_persona_text: String::new(),
            persona_presets: BTreeMap::new(),
            language: default_language(),
            show_button: false,
            button_label: String::new(),
            button_url: String::new(),
            blacklist: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let raw = fs::read_to_string(path)
            .map_err(|_| BeaconError::ConfigNotFound(path.to_path_buf()))?;
        let config: Config =
            serde_json::from_str(&raw).map_err(|err| BeaconError::ConfigMalformed {
                path: path.to_path_buf(),
                details: err.to_string(),
            })?;
        config.finalize()
    }

    fn finalize(mut self) -> Result<Config> {
        for (field, value) in [("client_id", &self.client_id), ("api_key", &self.api_key)] {
            if value.trim().is_empty() || value.starts_with(PLACEHOLDER_PREFIX) {
                return Err(BeaconError::ConfigFieldMissing(field.to_string()));
            }
        }
        self.update_interval = self
            .update_interval
            .clamp(MIN_UPDATE_INTERVAL, MAX_UPDATE_INTERVAL);
        Ok(self)
    }
}

/// Owns the config file path and reloads when its mtime moves forward.
pub struct ConfigManager {
    path: PathBuf,
    config: Config,
    last_modified: Option<SystemTime>,
}

impl ConfigManager {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = Config::load(&path)?;
        let last_modified = file_mtime(&path);
        Ok(Self {
            path,
            config,
            last_modified,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true when a newer file was loaded. A reload that fails to
    /// parse or validate keeps the previous configuration.
    pub fn check_reload(&mut self) -> bool {
        let Some(modified) = file_mtime(&self.path) else {
            return false;
        };
        let is_newer = self.last_modified.map_or(true, |prev| modified > prev);
        if !is_newer {
            return false;
        }
        self.last_modified = Some(modified);
        match Config::load(&self.path) {
            Ok(config) => {
                self.config = config;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "Config reload failed; keeping previous configuration");
                false
            }
        }
    }
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok().and_then(|meta| meta.modified().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).expect("create config");
        file.write_all(body.as_bytes()).expect("write config");
        path
    }

    fn minimal(extra: &str) -> String {
        format!(
            "{{\"client_id\": \"12345\", \"api_key\": \"sk-test\"{}{}}}",
            if extra.is_empty() { "" } else { ", " },
            extra
        )
    }

    #[test]
    fn minimal_config_gets_the_documented_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, &minimal(""));
        let config = Config::load(&path).expect("load");

        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.update_interval, 20);
        assert_eq!(config.persona, "custom");
        assert_eq!(config.language, "en");
        assert!(!config.show_button);
        assert!(config.tracked_apps.is_empty());
        assert!(config.blacklist.is_empty());
    }

    #[test]
    fn interval_below_the_floor_clamps_to_fifteen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, &minimal("\"update_interval\": 5"));
        let config = Config::load(&path).expect("load");
        assert_eq!(config.update_interval, 15);
    }

    #[test]
    fn interval_above_the_ceiling_clamps_to_sixty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, &minimal("\"update_interval\": 600"));
        let config = Config::load(&path).expect("load");
        assert_eq!(config.update_interval, 60);
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, "{\"client_id\": \"12345\", \"api_key\": \"\"}");
        assert!(matches!(
            Config::load(&path),
            Err(BeaconError::ConfigFieldMissing(field)) if field == "api_key"
        ));
    }

    #[test]
    fn placeholder_values_count_as_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(
            &dir,
            "{\"client_id\": \"YOUR_CLIENT_ID\", \"api_key\": \"sk-test\"}",
        );
        assert!(matches!(
            Config::load(&path),
            Err(BeaconError::ConfigFieldMissing(field)) if field == "client_id"
        ));
    }

    #[test]
    fn malformed_json_is_fatal_at_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, "{not json");
        assert!(matches!(
            Config::load(&path),
            Err(BeaconError::ConfigMalformed { .. })
        ));
    }

    #[test]
    fn missing_file_is_fatal_at_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope.json");
        assert!(matches!(
            Config::load(&path),
            Err(BeaconError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn reload_picks_up_a_newer_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, &minimal("\"update_interval\": 20"));
        let mut manager = ConfigManager::load(&path).expect("load");
        assert!(!manager.check_reload());

        std::fs::write(&path, minimal("\"update_interval\": 45")).expect("rewrite");
        let file = std::fs::File::options()
            .write(true)
            .open(&path)
            .expect("open");
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .expect("bump mtime");

        assert!(manager.check_reload());
        assert_eq!(manager.config().update_interval, 45);
    }

    #[test]
    fn broken_reload_keeps_the_previous_configuration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, &minimal(""));
        let mut manager = ConfigManager::load(&path).expect("load");

        std::fs::write(&path, "{broken").expect("rewrite");
        let file = std::fs::File::options()
            .write(true)
            .open(&path)
            .expect("open");
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .expect("bump mtime");

        assert!(!manager.check_reload());
        assert_eq!(manager.config().client_id, "12345");
    }
}
