//! Gemini `generateContent` REST client (blocking).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ReportError, ReportGenerator};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct GeminiOptions {
    pub endpoint: String,
    pub model: String,
    /// `None` makes every call fail with `MissingCredential`.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for GeminiOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct GeminiClient {
    client: reqwest::blocking::Client,
    options: GeminiOptions,
}

impl GeminiClient {
    pub fn new(options: GeminiOptions) -> Result<Self, ReportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| ReportError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, options })
    }

    pub fn model(&self) -> &str {
        &self.options.model
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.options.endpoint.trim_end_matches('/'),
            self.options.model
        )
    }
}

/// Concatenated text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, ReportError> {
    let resp: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ReportError::Http(format!("unreadable response: {e}")))?;
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        Err(ReportError::EmptyResponse)
    } else {
        Ok(text)
    }
}

fn service_error(status: u16, body: &str) -> ReportError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    ReportError::Service { status, message }
}

impl ReportGenerator for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, prompt: &str) -> Result<String, ReportError> {
        let key = self
            .options
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ReportError::MissingCredential(API_KEY_ENV.to_string()))?;

        let request = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
        };

        debug!(model = %self.options.model, prompt_len = prompt.len(), "requesting report");
        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", key)
            .json(&request)
            .send()
            .map_err(|e| ReportError::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().map_err(|e| ReportError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(service_error(status.as_u16(), &body));
        }

        let text = extract_text(&body)?;
        info!(model = %self.options.model, chars = text.len(), "report generated");
        Ok(text)
    }
}
