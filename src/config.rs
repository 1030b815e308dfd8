// Configuration for the assist stack: generator endpoint and the
// selection-tracker settle window. Loaded from a TOML file in the user's
// config directory; a missing file just means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How long an empty-selection event must go unchallenged before the
    /// published selection is cleared
    #[serde(default = "default_settle_window_ms")]
    pub settle_window_ms: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_settle_window_ms() -> u64 {
    150
}

impl Default for AssistConfig {
    fn default() -> Self {
        AssistConfig {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            settle_window_ms: default_settle_window_ms(),
        }
    }
}

impl AssistConfig {
    /// Load from the user's config directory, falling back to defaults
    /// when no file exists. `REDRAFT_API_KEY` overrides the file's key.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };

        if let Ok(key) = std::env::var("REDRAFT_API_KEY")
            && !key.is_empty()
        {
            config.api_key = key;
        }

        Ok(config)
    }

    /// Load from an explicit file path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "redraft").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn settle_window(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.settle_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = AssistConfig::default();
        assert!(config.base_url.starts_with("https://"));
        assert!(config.api_key.is_empty());
        assert_eq!(config.settle_window().as_millis(), 150);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: AssistConfig =
            toml::from_str("api_key = \"sk-test\"\nmodel = \"local-model\"").unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "local-model");
        assert_eq!(config.base_url, default_base_url());
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let dir = std::env::temp_dir();
        let path = dir.join("redraft-config-test.toml");
        fs::write(&path, "api_key = [not toml").unwrap();

        let err = AssistConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let _ = fs::remove_file(&path);
    }
}
