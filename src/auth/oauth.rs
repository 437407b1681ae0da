use anyhow::{Result, anyhow};
use chrono::Utc;
use oauth2::TokenResponse;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::http_client;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret as OAuthClientSecret, CsrfToken,
    PkceCodeChallenge, RedirectUrl, RefreshToken, Scope, TokenUrl,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tiny_http::{Response, Server};
use url::Url;

use crate::auth::credential::{ClientSecret, Credential, GOOGLE_AUTH_URL};

/// Options for the interactive consent flow.
#[derive(Debug, Clone)]
pub struct ConsentOptions {
    /// 0 binds an ephemeral port.
    pub redirect_port: u16,
    pub timeout: Duration,
    pub open_browser: bool,
}

impl Default for ConsentOptions {
    fn default() -> Self {
        Self {
            redirect_port: 0,
            timeout: Duration::from_secs(120),
            open_browser: true,
        }
    }
}

/// Build a credential from a token endpoint response. `previous_refresh`
/// is kept when the provider does not rotate the refresh token.
fn credential_from_response(
    token: &BasicTokenResponse,
    client_id: &str,
    client_secret: Option<&str>,
    token_uri: &str,
    scopes: &[String],
    previous_refresh: Option<&str>,
) -> Credential {
    let granted = token
        .scopes()
        .map(|s| s.iter().map(|s| s.as_str().to_string()).collect())
        .unwrap_or_else(|| scopes.to_vec());
    let expiry = token
        .expires_in()
        .and_then(|d| chrono::Duration::from_std(d).ok())
        .map(|d| Utc::now() + d);

    Credential {
        token: token.access_token().secret().to_string(),
        refresh_token: token
            .refresh_token()
            .map(|r| r.secret().to_string())
            .or_else(|| previous_refresh.map(str::to_string)),
        token_uri: token_uri.to_string(),
        client_id: client_id.to_string(),
        client_secret: client_secret.map(str::to_string),
        scopes: granted,
        expiry,
    }
}

/// Exchange the credential's refresh token for a new access token.
pub fn refresh_credential(cred: &Credential) -> Result<Credential> {
    let refresh = cred
        .refresh_token
        .as_deref()
        .ok_or_else(|| anyhow!("credential has no refresh token"))?;

    let oauth_client = BasicClient::new(
        ClientId::new(cred.client_id.clone()),
        cred.client_secret.clone().map(OAuthClientSecret::new),
        AuthUrl::new(GOOGLE_AUTH_URL.to_string())?,
        Some(TokenUrl::new(cred.token_uri.clone())?),
    )
    .set_auth_type(AuthType::RequestBody);

    let token = oauth_client
        .exchange_refresh_token(&RefreshToken::new(refresh.to_string()))
        .request(http_client)
        .map_err(|e| anyhow!("token refresh failed: {e}"))?;

    Ok(credential_from_response(
        &token,
        &cred.client_id,
        cred.client_secret.as_deref(),
        &cred.token_uri,
        &cred.scopes,
        Some(refresh),
    ))
}

/// Authorization Code + PKCE flow. Opens the system browser and captures the
/// redirect on a loopback listener.
pub fn run_consent_flow(
    secret: &ClientSecret,
    scopes: &[String],
    opts: &ConsentOptions,
) -> Result<Credential> {
    // Listen first so the redirect cannot race the browser.
    let bind_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, opts.redirect_port));
    let server = Server::http(bind_addr)
        .map_err(|e| anyhow!("Failed to bind OAuth callback server on {bind_addr}: {e}"))?;
    let port = server
        .server_addr()
        .to_ip()
        .map(|a| a.port())
        .ok_or_else(|| anyhow!("OAuth callback server has no IP address"))?;
    let redirect_uri = format!("http://127.0.0.1:{port}/");

    let oauth_client = BasicClient::new(
        ClientId::new(secret.client_id.clone()),
        secret.client_secret.clone().map(OAuthClientSecret::new),
        AuthUrl::new(secret.auth_uri.clone())?,
        Some(TokenUrl::new(secret.token_uri.clone())?),
    )
    .set_auth_type(AuthType::RequestBody)
    .set_redirect_uri(RedirectUrl::new(redirect_uri.clone())?);

    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

    let (auth_url, csrf_token) = oauth_client
        .authorize_url(CsrfToken::new_random)
        .add_scopes(scopes.iter().cloned().map(Scope::new))
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .set_pkce_challenge(pkce_challenge)
        .url();

    eprintln!("Open this URL in your browser to authorize access:\n{auth_url}");
    if opts.open_browser
        && let Err(e) = open::that(auth_url.as_str())
    {
        log::warn!("could not open browser automatically: {e}");
    }

    let code = wait_for_code(&server, &redirect_uri, csrf_token.secret(), opts.timeout)?;
    log::info!("authorization code received, exchanging for tokens");

    let token = oauth_client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(pkce_verifier)
        .request(http_client)
        .map_err(|e| anyhow!("token exchange failed: {e}"))?;

    Ok(credential_from_response(
        &token,
        &secret.client_id,
        secret.client_secret.as_deref(),
        &secret.token_uri,
        scopes,
        None,
    ))
}

/// Outcome of inspecting one redirect request.
#[derive(Debug, PartialEq)]
enum Callback {
    Code(String),
    Denied(String),
    Ignored,
}

fn parse_callback(redirect_uri: &str, request_url: &str, expected_state: &str) -> Callback {
    // request_url is path+query like "/?code=...&state=..."
    let Ok(parsed) = Url::parse(redirect_uri).and_then(|base| base.join(request_url)) else {
        return Callback::Ignored;
    };

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (k, v) in parsed.query_pairs() {
        match k.as_ref() {
            "code" => code = Some(v.into_owned()),
            "state" => state = Some(v.into_owned()),
            "error" => error = Some(v.into_owned()),
            _ => {}
        }
    }

    if let Some(e) = error {
        return Callback::Denied(e);
    }
    match (code, state) {
        (Some(c), Some(s)) if s == expected_state => Callback::Code(c),
        _ => Callback::Ignored,
    }
}

fn wait_for_code(
    server: &Server,
    redirect_uri: &str,
    expected_state: &str,
    timeout: Duration,
) -> Result<String> {
    let wait_until = Instant::now() + timeout;

    while Instant::now() < wait_until {
        let maybe_request = server.recv_timeout(Duration::from_millis(500)).map_err(|e| {
            log::warn!("OAuth callback listener failed: {e}");
            anyhow!("OAuth callback server failed: {e}")
        })?;
        let Some(request) = maybe_request else {
            continue;
        };

        match parse_callback(redirect_uri, request.url(), expected_state) {
            Callback::Code(code) => {
                let _ = request.respond(Response::from_string(
                    "Authorization received. You can close this tab.",
                ));
                return Ok(code);
            }
            Callback::Denied(err) => {
                let _ = request.respond(Response::from_string(
                    "Authorization was denied. You can close this tab.",
                ));
                return Err(anyhow!("authorization denied: {err}"));
            }
            Callback::Ignored => {
                let _ = request.respond(
                    Response::from_string("No authorization code found.").with_status_code(400),
                );
            }
        }
    }

    Err(anyhow!(
        "No authorization code received within {}s",
        timeout.as_secs()
    ))
}
