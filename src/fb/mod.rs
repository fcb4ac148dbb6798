//! Facebook Graph API conversation fetching.
//!
//! [`GraphClient`] performs one listing call per invocation against the
//! Page conversations endpoint, requesting the nested messages with the
//! `message`, `from`, and `created_time` fields. No caching, no retries:
//! a provider failure propagates to the caller with its status and body.
//!
//! The [`ConversationSource`] trait is the fetch contract the HTTP layer
//! consumes, so handlers can be exercised against a stub.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::config::FacebookConfig;

/// Nested message fields requested per conversation.
const CONVERSATION_FIELDS: &str = "messages{message,from,created_time}";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while fetching conversations from the provider.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The access token is not configured. Checked before any I/O.
    #[error("missing Facebook access token")]
    MissingAccessToken,
    /// HTTP transport failure, including timeout expiry.
    #[error("graph request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The provider responded with a non-success status. The body is
    /// kept verbatim so the caller sees exactly what the provider said.
    #[error("graph API returned non-success status {status}")]
    Upstream {
        /// Provider HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// A success response that was not valid JSON.
    #[error("graph response was not valid JSON: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Fetch contract
// ---------------------------------------------------------------------------

/// Source of raw conversation payloads.
///
/// Implementations must be `Send + Sync` for use across async handler
/// boundaries.
#[async_trait]
pub trait ConversationSource: Send + Sync {
    /// Fetch the raw conversations listing payload.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on missing credential, transport failure,
    /// or a non-success provider response.
    async fn fetch_conversations(&self) -> Result<Value, FetchError>;
}

// ---------------------------------------------------------------------------
// Graph client
// ---------------------------------------------------------------------------

/// Graph API client bound to one Page identity.
#[derive(Debug, Clone)]
pub struct GraphClient {
    base: String,
    api_version: String,
    page_id: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl GraphClient {
    /// Create a client from configuration with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &FacebookConfig, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base: config.graph_api_base.clone(),
            api_version: config.api_version.clone(),
            page_id: config.page_id.clone(),
            access_token: config.access_token.clone(),
            client,
        })
    }
}

/// Build the conversations listing URL for a Page.
#[doc(hidden)]
pub fn build_conversations_url(base: &str, api_version: &str, page_id: &str) -> String {
    format!("{base}/{api_version}/{page_id}/conversations")
}

#[async_trait]
impl ConversationSource for GraphClient {
    async fn fetch_conversations(&self) -> Result<Value, FetchError> {
        // Credential presence is checked before any network call.
        let token = self
            .access_token
            .as_deref()
            .ok_or(FetchError::MissingAccessToken)?;

        let url = build_conversations_url(&self.base, &self.api_version, &self.page_id);
        tracing::debug!(page_id = %self.page_id, "fetching conversations");

        let response = self
            .client
            .get(&url)
            .query(&[("fields", CONVERSATION_FIELDS), ("access_token", token)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = %sanitize_error_body(&body),
                "graph API returned non-success status"
            );
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Collapse whitespace, redact token-shaped substrings, and truncate an
/// error body for logging. The client-facing body is never sanitized;
/// this guards log sinks only.
#[doc(hidden)]
pub fn sanitize_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [
        r"EAA[A-Za-z0-9]{20,}",
        r"AIza[A-Za-z0-9_\-]{30,}",
        r"access_token=[A-Za-z0-9_\-%]+",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}
