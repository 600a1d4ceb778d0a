//! Connection settings for the Redmine server.
//!
//! Stored as `<config dir>/config.json` next to the timer file. The config
//! directory defaults to `~/.redminecli`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

pub const CONFIG_DIR_NAME: &str = ".redminecli";
pub const CONFIG_FILE: &str = "config.json";
pub const URL_ENV: &str = "REDMINE_URL";
pub const KEY_ENV: &str = "REDMINE_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub url: String,
    pub key: String,
}

impl Config {
    /// Builds a validated config, trimming any trailing slash from the URL.
    pub fn new(url: &str, key: &str) -> Result<Self> {
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("Redmine URL must start with http:// or https://, got '{}'", url);
        }
        let key = key.trim();
        if key.is_empty() {
            bail!("API key must not be empty");
        }
        Ok(Self {
            url: url.to_string(),
            key: key.to_string(),
        })
    }

    /// Applies `REDMINE_URL` / `REDMINE_API_KEY` overrides.
    fn with_overrides(self, url: Option<String>, key: Option<String>) -> Result<Self> {
        match (url, key) {
            (None, None) => Ok(self),
            (url, key) => Config::new(
                url.as_deref().unwrap_or(&self.url),
                key.as_deref().unwrap_or(&self.key),
            ),
        }
    }
}

pub fn default_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine the home directory")?;
    Ok(home.join(CONFIG_DIR_NAME))
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Reads the stored configuration, then applies environment overrides.
pub fn load(dir: &Path) -> Result<Config> {
    let stored = read_file(dir)?;
    let url = std::env::var(URL_ENV).ok().filter(|v| !v.is_empty());
    let key = std::env::var(KEY_ENV).ok().filter(|v| !v.is_empty());

    match stored {
        Some(config) => config.with_overrides(url, key),
        None => match (url, key) {
            (Some(url), Some(key)) => Config::new(&url, &key),
            _ => bail!(
                "Configuration file not found: {}. Use 'redminecli config' to set up your configuration.",
                config_path(dir).display()
            ),
        },
    }
}

fn read_file(dir: &Path) -> Result<Option<Config>> {
    let path = config_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Configuration file {} is malformed", path.display()))?;
    Ok(Some(config))
}

pub fn save(dir: &Path, config: &Config) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = config_path(dir);
    let content = serde_json::to_string_pretty(config)?;

    let mut temp_file = NamedTempFile::new_in(dir).context("Failed to create temp file")?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.flush()?;
    temp_file
        .persist(&path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(path = %path.display(), "saved configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = Config::new("https://redmine.example.com/", "abc123").unwrap();
        assert_eq!(config.url, "https://redmine.example.com");
        assert_eq!(config.key, "abc123");
    }

    #[test]
    fn test_new_rejects_bad_url() {
        let err = Config::new("redmine.example.com", "abc").unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_new_rejects_empty_key() {
        assert!(Config::new("https://redmine.example.com", "  ").is_err());
    }

    #[test]
    fn test_save_then_read() {
        let dir = tempdir().unwrap();
        let cfg_dir = dir.path().join(CONFIG_DIR_NAME);
        let config = Config::new("https://redmine.example.com", "abc123").unwrap();

        save(&cfg_dir, &config).unwrap();
        assert_eq!(read_file(&cfg_dir).unwrap(), Some(config));
    }

    #[test]
    fn test_read_missing_is_none() {
        let dir = tempdir().unwrap();
        assert_eq!(read_file(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_read_malformed_is_error() {
        let dir = tempdir().unwrap();
        fs::write(config_path(dir.path()), "{\"url\": 3}").unwrap();
        let err = read_file(dir.path()).unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn test_overrides_replace_stored_values() {
        let stored = Config::new("https://old.example.com", "old").unwrap();

        let merged = stored
            .clone()
            .with_overrides(Some("https://new.example.com/".to_string()), None)
            .unwrap();
        assert_eq!(merged.url, "https://new.example.com");
        assert_eq!(merged.key, "old");

        let untouched = stored.clone().with_overrides(None, None).unwrap();
        assert_eq!(untouched, stored);
    }
}
