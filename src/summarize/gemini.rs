use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::google::check_status;
use crate::summarize::TextGenerator;

/// Handle to the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("inbox_digest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(api_key: String, cfg: &Config) -> Result<Self> {
        Self::new(api_key, cfg.gemini_model.clone(), cfg.gemini_api_base.clone())
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateRequest {
            contents: [Content {
                parts: [TextPart { text: prompt }],
            }],
        };

        log::debug!("calling {} ({} prompt chars)", self.model, prompt.chars().count());
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?;
        let resp = check_status(resp).with_context(|| format!("calling {}", self.model))?;

        let reply: GenerateResponse = resp.json()?;
        let candidate = reply
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Gemini returned no candidates"))?;
        // A blocked or truncated candidate arrives without text parts.
        let texts: Vec<String> = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if texts.is_empty() {
            return Err(match candidate.finish_reason {
                Some(reason) => anyhow!("Gemini returned no text (finishReason: {reason})"),
                None => anyhow!("Gemini returned no text"),
            });
        }
        Ok(texts.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::{SUMMARY_ERROR_PREFIX, Summarizer};
    use mockito::Matcher;

    const PATH: &str = "/v1beta/models/gemini-test:generateContent";

    fn client(server: &mockito::Server) -> GeminiClient {
        GeminiClient::new("k3y", "gemini-test", server.url()).unwrap()
    }

    #[test]
    fn sends_prompt_and_joins_parts() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "k3y")
            .match_body(Matcher::Json(serde_json::json!({
                "contents": [{"parts": [{"text": "resuma isto"}]}]
            })))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates": [{"content": {"role": "model",
                    "parts": [{"text": "Resumo "}, {"text": "curto."}]},
                    "finishReason": "STOP"}],
                    "usageMetadata": {"totalTokenCount": 12}}"#,
            )
            .create();

        assert_eq!(client(&server).generate("resuma isto").unwrap(), "Resumo curto.");
        m.assert();
    }

    #[test]
    fn no_candidates_is_an_error() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("POST", PATH)
            .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create();

        let err = client(&server).generate("x").unwrap_err();
        assert!(err.to_string().contains("no candidates"));
    }

    #[test]
    fn http_error_carries_status() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("POST", PATH)
            .with_status(403)
            .with_body(r#"{"error": {"message": "API key not valid"}}"#)
            .create();

        let err = client(&server).generate("x").unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("calling gemini-test"));
        assert!(msg.contains("API error 403"));
        assert!(msg.contains("API key not valid"));
    }

    #[test]
    fn blocked_candidate_is_an_error() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("POST", PATH)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"finishReason": "SAFETY", "index": 0}]}"#)
            .create();

        let err = client(&server).generate("x").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Gemini returned no text (finishReason: SAFETY)"
        );
    }

    #[test]
    fn blocked_candidate_becomes_a_prefixed_summary() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("POST", PATH)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": []}, "finishReason": "RECITATION"}]}"#)
            .create();

        let out = Summarizer::new(client(&server), "English").summarize("body", "subject");
        assert!(out.starts_with(SUMMARY_ERROR_PREFIX));
        assert!(out.contains("RECITATION"));
    }
}
