use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::auth::credential::{ClientSecret, Credential};
use crate::auth::oauth::{self, ConsentOptions};
use crate::auth::tokens_file;
use crate::config::Config;

/// The two ways of minting a fresh credential.
pub trait Authorizer {
    fn refresh(&self, cred: &Credential) -> Result<Credential>;
    fn consent(&self, secret: &ClientSecret, scopes: &[String]) -> Result<Credential>;
}

/// Talks to the real identity provider.
pub struct OAuthAuthorizer {
    pub consent: ConsentOptions,
}

impl Authorizer for OAuthAuthorizer {
    fn refresh(&self, cred: &Credential) -> Result<Credential> {
        oauth::refresh_credential(cred)
    }

    fn consent(&self, secret: &ClientSecret, scopes: &[String]) -> Result<Credential> {
        oauth::run_consent_flow(secret, scopes, &self.consent)
    }
}

pub struct CredentialStore<A = OAuthAuthorizer> {
    pub token_path: PathBuf,
    pub client_secret_path: PathBuf,
    pub scopes: Vec<String>,
    /// Fall back to a full consent when the refresh exchange fails.
    pub reconsent_on_refresh_failure: bool,
    authorizer: A,
}

impl CredentialStore<OAuthAuthorizer> {
    pub fn from_config(cfg: &Config, scopes: &[&str]) -> Self {
        let authorizer = OAuthAuthorizer {
            consent: ConsentOptions {
                redirect_port: cfg.redirect_port,
                timeout: std::time::Duration::from_secs(cfg.consent_timeout_secs),
                open_browser: true,
            },
        };
        let mut store = CredentialStore::with_authorizer(
            &cfg.token_path,
            &cfg.credentials_path,
            scopes,
            authorizer,
        );
        store.reconsent_on_refresh_failure = cfg.reconsent_on_refresh_failure;
        store
    }
}

impl<A: Authorizer> CredentialStore<A> {
    pub fn with_authorizer(
        token_path: &Path,
        client_secret_path: &Path,
        scopes: &[&str],
        authorizer: A,
    ) -> Self {
        Self {
            token_path: token_path.to_path_buf(),
            client_secret_path: client_secret_path.to_path_buf(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            reconsent_on_refresh_failure: false,
            authorizer,
        }
    }

    /// Returns a usable credential, refreshing or running consent as needed.
    /// Any newly minted credential is written back to `token_path`.
    pub fn obtain(&self) -> Result<Credential> {
        let stored = tokens_file::load_credential(&self.token_path)?;

        let fresh = match stored {
            Some(cred) if cred.is_valid_at(Utc::now(), &self.scopes) => {
                log::info!("using stored credential from {}", self.token_path.display());
                return Ok(cred);
            }
            Some(cred) if cred.can_refresh() && cred.covers_scopes(&self.scopes) => {
                log::info!("stored credential expired; refreshing");
                match self.authorizer.refresh(&cred) {
                    Ok(c) => c,
                    Err(e) if self.reconsent_on_refresh_failure => {
                        log::warn!("refresh failed ({e:#}); falling back to consent");
                        self.consent()?
                    }
                    Err(e) => return Err(e.context("refreshing stored credential")),
                }
            }
            Some(_) => {
                log::info!("stored credential unusable; running consent flow");
                self.consent()?
            }
            None => {
                log::info!("no stored credential; running consent flow");
                self.consent()?
            }
        };

        tokens_file::save_credential(&self.token_path, &fresh)?;
        log::info!("saved credential to {}", self.token_path.display());
        Ok(fresh)
    }

    fn consent(&self) -> Result<Credential> {
        let secret = ClientSecret::load(&self.client_secret_path)
            .context("cannot start the consent flow")?;
        self.authorizer.consent(&secret, &self.scopes)
    }
}

/// One-shot helper with the default OAuth authorizer.
pub fn obtain_credential(
    stored_path: &Path,
    client_secret_path: &Path,
    scopes: &[&str],
) -> Result<Credential> {
    CredentialStore::with_authorizer(
        stored_path,
        client_secret_path,
        scopes,
        OAuthAuthorizer {
            consent: ConsentOptions::default(),
        },
    )
    .obtain()
}
