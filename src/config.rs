/// Application configuration
///
/// Loaded from a TOML file under the user's config directory
/// (e.g. ~/.config/content-hub/config.toml on Linux). Missing or
/// unparsable files fall back to defaults so the app always starts.
///
/// Upload size limits are configurable per deployment; the defaults
/// match the backend's own 300MB cap.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::warn;

const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the dashboard REST backend
    pub api_base_url: String,
    /// Maximum accepted photo upload size, in megabytes
    pub photo_limit_mb: u64,
    /// Maximum accepted document upload size, in megabytes
    pub document_limit_mb: u64,
    /// Page size for the people directory
    pub people_page_size: u32,
    /// Dark theme on startup
    pub dark_theme: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            photo_limit_mb: 300,
            document_limit_mb: 300,
            people_page_size: 20,
            dark_theme: true,
        }
    }
}

impl Config {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("content-hub");
        path.push("config.toml");
        path
    }

    /// Load the config file, falling back to defaults on any failure.
    pub fn load() -> Self {
        let path = Self::config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!("invalid config at {}: {err}", path.display());
                    Config::default()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => Config::default(),
            Err(err) => {
                warn!("failed to read config at {}: {err}", path.display());
                Config::default()
            }
        }
    }

    /// Persist the current settings (used by the theme toggle).
    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        fs::write(path, contents)
    }

    pub fn photo_limit_bytes(&self) -> u64 {
        self.photo_limit_mb * MB
    }

    pub fn document_limit_bytes(&self) -> u64 {
        self.document_limit_mb * MB
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.photo_limit_mb, 300);
        assert_eq!(config.people_page_size, 20);
        assert_eq!(config.photo_limit_bytes(), 300 * 1024 * 1024);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: Config = toml::from_str("photo_limit_mb = 5").unwrap();
        assert_eq!(config.photo_limit_mb, 5);
        assert_eq!(config.document_limit_mb, 300);
        assert_eq!(config.api_base_url, Config::default().api_base_url);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.dark_theme = false;
        config.people_page_size = 40;

        let serialized = toml::to_string_pretty(&config).unwrap();
        let restored: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, restored);
    }
}
