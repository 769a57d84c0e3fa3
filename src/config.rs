use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

pub const DEFAULT_API_BASE_URL: &str = "https://avdevplanner.onrender.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_log_path")]
    pub log_path: String,
    /// Per-request timeout. Requests wait indefinitely when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_prev_month")]
    pub prev_month: String,
    #[serde(default = "default_next_month")]
    pub next_month: String,
    #[serde(default = "default_today")]
    pub today: String,
    #[serde(default = "default_select")]
    pub select: String,
    #[serde(default = "default_back")]
    pub back: String,
    #[serde(default = "default_refresh")]
    pub refresh: String,
    #[serde(default = "default_tab_left")]
    pub tab_left: String,
    #[serde(default = "default_tab_right")]
    pub tab_right: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    #[serde(default = "default_tab_bg")]
    pub tab_bg: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            database_path: default_database_path(),
            log_path: default_log_path(),
            request_timeout_secs: None,
            key_bindings: KeyBindings::default(),
            theme: Theme::default(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            prev_month: default_prev_month(),
            next_month: default_next_month(),
            today: default_today(),
            select: default_select(),
            back: default_back(),
            refresh: default_refresh(),
            tab_left: default_tab_left(),
            tab_right: default_tab_right(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            tab_bg: default_tab_bg(),
        }
    }
}

// Default value functions
fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_database_path() -> String {
    // Fallback only; the profile's path is filled in at load time
    data_file(utils::Profile::Prod, "state.db")
}

fn default_log_path() -> String {
    data_file(utils::Profile::Prod, "planner.log")
}

fn data_file(profile: utils::Profile, name: &str) -> String {
    match utils::get_data_dir(profile) {
        Some(dir) => dir.join(name).to_string_lossy().to_string(),
        None => match profile {
            utils::Profile::Dev => format!("~/.local/share/planner-dev/{}", name),
            utils::Profile::Prod => format!("~/.local/share/planner/{}", name),
        },
    }
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_prev_month() -> String {
    "p".to_string()
}

fn default_next_month() -> String {
    "n".to_string()
}

fn default_today() -> String {
    "t".to_string()
}

fn default_select() -> String {
    "Enter".to_string()
}

fn default_back() -> String {
    "Esc".to_string()
}

fn default_refresh() -> String {
    "Ctrl+r".to_string()
}

fn default_tab_left() -> String {
    "Ctrl+Left".to_string()
}

fn default_tab_right() -> String {
    "Tab".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_highlight_fg() -> String {
    "white".to_string()
}

fn default_tab_bg() -> String {
    "gray".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid key binding for {action}: {message}")]
    KeyBindingError { action: &'static str, message: String },
}

impl Config {
    /// Load configuration from the profile's config directory, creating it
    /// with defaults if missing
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_or_create(&config_path, profile)
    }

    /// Load from an explicit path (`--config`). A missing file is created
    /// with defaults, just like the profile location.
    pub fn load_from_path(path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        Self::load_or_create(path, profile)
    }

    fn load_or_create(config_path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let config: Config = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let mut config = Config {
                database_path: data_file(profile, "state.db"),
                log_path: data_file(profile, "planner.log"),
                ..Config::default()
            };
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
            }
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| {
                ConfigError::ConfigDirError("Could not determine config directory".to_string())
            })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    pub fn get_log_path(&self) -> PathBuf {
        utils::expand_path(&self.log_path)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Reject key bindings that cannot be parsed, so a typo fails at
    /// startup instead of silently disabling a key
    fn validate(&self) -> Result<(), ConfigError> {
        for (action, binding) in self.key_bindings.entries() {
            utils::parse_key_binding(binding)
                .map_err(|message| ConfigError::KeyBindingError { action, message })?;
        }
        Ok(())
    }
}

impl KeyBindings {
    pub fn entries(&self) -> [(&'static str, &str); 9] {
        [
            ("quit", self.quit.as_str()),
            ("prev_month", self.prev_month.as_str()),
            ("next_month", self.next_month.as_str()),
            ("today", self.today.as_str()),
            ("select", self.select.as_str()),
            ("back", self.back.as_str()),
            ("refresh", self.refresh.as_str()),
            ("tab_left", self.tab_left.as_str()),
            ("tab_right", self.tab_right.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let config = Config::load_from_path(&path, utils::Profile::Dev).unwrap();
        assert!(path.exists());
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout(), None);
        assert!(config.database_path.contains("planner-dev"));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("api_base_url"));
        assert!(written.contains("config_version = 1"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_base_url = \"http://localhost:5000\"\nrequest_timeout_secs = 10\n\n\
             [key_bindings]\nquit = \"x\"\n",
        )
        .unwrap();
        let config = Config::load_from_path(&path, utils::Profile::Prod).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.key_bindings.quit, "x");
        assert_eq!(config.key_bindings.select, "Enter");
        assert_eq!(config.theme, Theme::default());
    }

    #[test]
    fn bad_key_binding_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[key_bindings]\nquit = \"NotAKey\"\n").unwrap();
        let err = Config::load_from_path(&path, utils::Profile::Prod).unwrap_err();
        assert!(matches!(err, ConfigError::KeyBindingError { action: "quit", .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_base_url = [").unwrap();
        assert!(matches!(
            Config::load_from_path(&path, utils::Profile::Prod),
            Err(ConfigError::ParseError(_))
        ));
    }
}
