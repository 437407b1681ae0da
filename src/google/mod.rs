use anyhow::{Result, anyhow};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::auth::credential::Credential;
use crate::config::Config;

/// An authenticated handle to the Google REST APIs.
pub struct GoogleSession {
    http: Client,
    access_token: String,
    pub gmail_base: String,
    pub calendar_base: String,
}

impl GoogleSession {
    pub fn new(
        access_token: impl Into<String>,
        gmail_base: impl Into<String>,
        calendar_base: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("inbox_digest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            access_token: access_token.into(),
            gmail_base: trim_base(gmail_base.into()),
            calendar_base: trim_base(calendar_base.into()),
        })
    }

    pub fn from_config(cred: &Credential, cfg: &Config) -> Result<Self> {
        Self::new(
            cred.token.clone(),
            cfg.gmail_api_base.clone(),
            cfg.calendar_api_base.clone(),
        )
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url).bearer_auth(&self.access_token)
    }
}

fn trim_base(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}

/// Pass 2xx responses through; anything else becomes an error carrying the
/// status code and the response text.
pub fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(anyhow!("API error {}: {}", status.as_u16(), body.trim()))
}

/// Send `req` and decode a JSON body. Non-2xx statuses are errors.
pub fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let resp = check_status(req.send()?)?;
    Ok(resp.json::<T>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn success_body_is_decoded() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/ok")
            .with_header("content-type", "application/json")
            .with_body(r#"{"n": 1}"#)
            .create();

        let v: Value = send_json(Client::new().get(format!("{}/ok", server.url()))).unwrap();
        assert_eq!(v["n"], 1);
    }

    #[test]
    fn error_status_keeps_code_and_trimmed_body() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("POST", "/fail")
            .with_status(429)
            .with_body("  quota exceeded\n")
            .create();

        let resp = Client::new()
            .post(format!("{}/fail", server.url()))
            .send()
            .unwrap();
        let err = check_status(resp).unwrap_err();
        assert_eq!(err.to_string(), "API error 429: quota exceeded");
    }
}
