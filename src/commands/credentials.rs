use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;

use super::prompt;
use crate::config::{self, Config};

/// Saves the server URL and API key, asking for whichever was not given.
pub fn configure<R: BufRead, W: Write>(
    dir: &Path,
    url: Option<String>,
    key: Option<String>,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let url = match url {
        Some(u) => u,
        None => prompt::required(input, out, "Redmine URL")?,
    };
    let key = match key {
        Some(k) => k,
        None => prompt::required(input, out, "API Key")?,
    };

    let config = Config::new(&url, &key)?;
    config::save(dir, &config)?;
    writeln!(out, "Configuration saved successfully.")?;
    Ok(())
}

pub fn show<W: Write>(dir: &Path, out: &mut W) -> Result<()> {
    let config = config::load(dir)?;
    writeln!(out, "Redmine URL: {}", config.url)?;
    writeln!(out, "API Key: {}", config.key)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn test_configure_with_flags() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        configure(
            dir.path(),
            Some("https://redmine.example.com/".to_string()),
            Some("abc123".to_string()),
            &mut Cursor::new(""),
            &mut out,
        )
        .unwrap();

        assert!(String::from_utf8(out).unwrap().contains("Configuration saved successfully."));
        let raw = std::fs::read_to_string(config::config_path(dir.path())).unwrap();
        let saved: Config = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved.url, "https://redmine.example.com");
        assert_eq!(saved.key, "abc123");
    }

    #[test]
    fn test_configure_prompts_for_missing_values() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        configure(
            dir.path(),
            None,
            None,
            &mut Cursor::new("https://redmine.example.com\nkey-from-prompt\n"),
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Redmine URL: "));
        assert!(text.contains("API Key: "));
        assert!(config::config_path(dir.path()).exists());
    }

    #[test]
    fn test_configure_rejects_invalid_url() {
        let dir = tempdir().unwrap();
        let result = configure(
            dir.path(),
            Some("ftp://nope".to_string()),
            Some("k".to_string()),
            &mut Cursor::new(""),
            &mut Vec::new(),
        );
        assert!(result.is_err());
        assert!(!config::config_path(dir.path()).exists());
    }
}
