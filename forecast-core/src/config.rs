use anyhow::{Context, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    provider::openweather::DEFAULT_BASE_URL,
    view::DEFAULT_PAGE_SIZE,
};

/// Environment variable that overrides the API key stored on disk.
pub const API_KEY_ENV: &str = "FORECAST_API_KEY";

pub const MISSING_API_KEY: &str =
    "No API key configured.\nHint: run `forecast configure` or set FORECAST_API_KEY.";

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// refresh_interval_secs = 300
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather credential. Absence blocks every fetch.
    pub api_key: Option<String>,

    pub base_url: String,

    pub refresh_interval_secs: u64,

    pub cache_ttl_secs: u64,

    pub page_size: usize,

    /// Where saved forecasts are kept. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    /// `FORECAST_API_KEY` takes precedence over the stored key.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;

        if let Some(key) = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()) {
            cfg.api_key = Some(key);
        }

        Ok(cfg)
    }

    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> anyhow::Result<ProjectDirs> {
        ProjectDirs::from("dev", "forecast", "forecast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> anyhow::Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding the persisted forecast collection.
    pub fn data_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Returns the API key, if present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_none_when_not_set() {
        assert!(Config::default().api_key().is_none());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn set_api_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("OPEN_KEY".into());
        assert_eq!(cfg.api_key(), Some("OPEN_KEY"));
    }

    #[test]
    fn defaults_match_dashboard_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(300));
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(300));
        assert_eq!(cfg.page_size(), 10);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(r#"api_key = "abc""#).unwrap();
        assert_eq!(cfg.api_key(), Some("abc"));
        assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
        assert!(cfg.data_dir.is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.page_size = 25;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key(), Some("KEY"));
        assert_eq!(loaded.page_size, 25);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.api_key.is_none());
    }
}
