/// Configuration for the task board client.
/// Reads client.json from ~/.config/taskboard/client.json (or platform equivalent).

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use taskboard_core::engine::EngineOptions;

/// Environment variable that overrides `base_url`.
pub const URL_ENV: &str = "TASKBOARD_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub fallback_to_demo_data: bool,
    #[serde(default = "default_true")]
    pub fallback_to_default_columns: bool,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            fallback_to_demo_data: true,
            fallback_to_default_columns: true,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            fallback_to_demo_data: self.fallback_to_demo_data,
            fallback_to_default_columns: self.fallback_to_default_columns,
        }
    }

    /// Replace `base_url` when an override is set and non-blank.
    pub fn with_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            log::info!("[taskboard.config] base url overridden: {}", url);
            self.base_url = url;
        }
        self
    }
}

/// Default config path: ~/.config/taskboard/client.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
        .join("client.json")
}

/// Read a config file. `Ok(None)` when the file does not exist.
pub fn read_config(path: &Path) -> Result<Option<ClientConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
}

/// Load config from path. Returns default if the file doesn't exist or
/// can't be used.
pub fn load_config(path: &Path) -> ClientConfig {
    match read_config(path) {
        Ok(Some(config)) => config,
        Ok(None) => {
            log::info!("[taskboard.config] No config at {}, using defaults", path.display());
            ClientConfig::default()
        }
        Err(e) => {
            log::warn!("[taskboard.config] {}, using defaults", e);
            ClientConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        assert!(read_config(&path).unwrap().is_none());
        assert_eq!(load_config(&path), ClientConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        fs::write(&path, r#"{"base_url": "http://board.local:9000", "fallback_to_demo_data": false}"#)
            .unwrap();

        let config = load_config(&path);
        assert_eq!(config.base_url, "http://board.local:9000");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(!config.engine_options().fallback_to_demo_data);
        assert!(config.engine_options().fallback_to_default_columns);
    }

    #[test]
    fn test_unparsable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(read_config(&path), Err(ConfigError::Parse { .. })));
        assert_eq!(load_config(&path), ClientConfig::default());
    }

    #[test]
    fn test_url_override() {
        let config = ClientConfig::default().with_url_override(Some("http://10.0.0.2:8080".into()));
        assert_eq!(config.base_url, "http://10.0.0.2:8080");
        let config = config.with_url_override(Some("  ".into()));
        assert_eq!(config.base_url, "http://10.0.0.2:8080");
        let config = ClientConfig::default().with_url_override(None);
        assert_eq!(config.base_url, "http://localhost:8080");
    }
}
