use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::token_store;

pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Scopes requested from the identity provider. Not configurable.
pub const SCOPES: &[&str] = &[GMAIL_READONLY_SCOPE, CALENDAR_READONLY_SCOPE];

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    /// 0 lets the OS pick a free port for the consent callback.
    pub redirect_port: u16,
    pub consent_timeout_secs: u64,
    pub reconsent_on_refresh_failure: bool,
    pub max_emails: u32,
    pub max_events: u32,
    pub gemini_model: String,
    pub summary_language: String,
    pub gmail_api_base: String,
    pub calendar_api_base: String,
    pub gemini_api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            redirect_port: 0,
            consent_timeout_secs: 120,
            reconsent_on_refresh_failure: false,
            max_emails: 5,
            max_events: 5,
            gemini_model: "gemini-1.5-pro".to_string(),
            summary_language: "Portuguese".to_string(),
            gmail_api_base: "https://gmail.googleapis.com".to_string(),
            calendar_api_base: "https://www.googleapis.com".to_string(),
            gemini_api_base: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("inbox_digest"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    p.push("config.toml");
    Ok(p)
}

/// Load the config at `path`, or the default location when `None`.
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&s).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s)?;
    Ok(cfg)
}

/// Resolve the Gemini API key: environment first, then the OS keyring.
/// Absence is a configuration error.
pub fn resolve_api_key() -> Result<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        let key = key.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }
    let stored = token_store::load_api_key().unwrap_or_else(|e| {
        log::warn!("keyring unavailable: {e:#}");
        None
    });
    stored.ok_or_else(|| {
        anyhow::anyhow!(
            "Gemini API key not configured: set {API_KEY_ENV} or run `inbox_digest set-api-key`"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.token_path, PathBuf::from("token.json"));
        assert_eq!(cfg.credentials_path, PathBuf::from("credentials.json"));
        assert_eq!(cfg.max_emails, 5);
        assert_eq!(cfg.gemini_model, "gemini-1.5-pro");
        assert!(!cfg.reconsent_on_refresh_failure);
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let cfg = parse_config(
            r#"
            token_path = "/tmp/tok.json"
            max_events = 10
            summary_language = "English"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.token_path, PathBuf::from("/tmp/tok.json"));
        assert_eq!(cfg.max_events, 10);
        assert_eq!(cfg.max_emails, 5);
        assert_eq!(cfg.summary_language, "English");
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(cfg.redirect_port, 0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "max_emails = \"five\"").unwrap();
        assert!(load_config(Some(&p)).is_err());
    }
}
