use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens within this window of their expiry are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Persisted OAuth credential. Field names follow the google-auth
/// "authorized user" JSON so existing `token.json` files keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

impl Credential {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(exp) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= exp,
            None => false,
        }
    }

    pub fn covers_scopes(&self, scopes: &[String]) -> bool {
        scopes.iter().all(|s| self.scopes.contains(s))
    }

    /// Usable without any network round-trip.
    pub fn is_valid_at(&self, now: DateTime<Utc>, scopes: &[String]) -> bool {
        !self.token.is_empty() && !self.is_expired_at(now) && self.covers_scopes(scopes)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// `credentials.json` as downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecretFile {
    #[serde(default)]
    installed: Option<ClientSecret>,
    #[serde(default)]
    web: Option<ClientSecret>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URL.to_string()
}

impl ClientSecret {
    pub fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading client secret file {}", path.display()))?;
        Self::parse(&s).with_context(|| format!("parsing client secret file {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(s)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| anyhow!("expected an \"installed\" or \"web\" client section"))
    }
}
