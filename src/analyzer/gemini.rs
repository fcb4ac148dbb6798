//! Gemini provider implementation using the `generateContent` API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;

use super::{ModelError, TextModel};

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Gemini `generateContent` API request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    /// Content units for the request. One prompt, one unit.
    pub contents: Vec<GeminiContent>,
}

/// A content unit in Gemini format.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct GeminiContent {
    /// Content parts.
    pub parts: Vec<GeminiPart>,
}

/// One text part of a content unit.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct GeminiPart {
    /// The text content.
    pub text: String,
}

/// Gemini `generateContent` API response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    /// Generated candidates.
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

/// A single generation candidate.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    /// Candidate content.
    pub content: GeminiCandidateContent,
}

/// Content of a generation candidate.
#[doc(hidden)]
#[derive(Debug, Default, Deserialize)]
pub struct GeminiCandidateContent {
    /// Content parts; text parts are concatenated.
    #[serde(default)]
    pub parts: Vec<GeminiCandidatePart>,
}

/// One part of a candidate's content.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GeminiCandidatePart {
    /// Optional text payload.
    pub text: Option<String>,
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a Gemini API request carrying the prompt as the sole content unit.
#[doc(hidden)]
pub fn build_request(prompt: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![GeminiPart {
                text: prompt.to_owned(),
            }],
        }],
    }
}

/// Parse a Gemini API response into completion text.
///
/// Joins the text parts of the first candidate.
///
/// # Errors
///
/// Returns `ModelError::Parse` if the response cannot be deserialized or
/// contains no candidates.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, ModelError> {
    let resp: GeminiResponse =
        serde_json::from_str(body).map_err(|e| ModelError::Parse(e.to_string()))?;

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::Parse("missing candidates[0]".to_owned()))?;

    let text: String = candidate
        .content
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    Ok(text)
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Gemini `generateContent` API provider.
#[derive(Clone)]
pub struct GeminiModel {
    api_base: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiModel {
    /// Create a provider from configuration with an explicit request
    /// timeout.
    ///
    /// A missing API key is not an eager failure here: it surfaces as
    /// [`ModelError::Unavailable`] at call time, so the analyzer wraps it
    /// like any other cause.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &GeminiConfig, timeout: Duration) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }
}

impl std::fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiModel")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "__REDACTED__"))
            .finish()
    }
}

#[async_trait::async_trait]
impl TextModel for GeminiModel {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ModelError::Unavailable("missing Gemini API key".to_owned()))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        );
        let api_request = build_request(prompt);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(&api_request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ModelError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
