//! HTTP exposure layer.
//!
//! Two endpoints over shared [`AppState`]:
//! - `GET /fb/` — fetch + normalize the Page's conversations
//! - `POST /analyze-messages` — analyze one caller-supplied conversation
//!
//! Every handler returns `Result<Json<T>, ApiError>`; [`ApiError`]
//! implements [`IntoResponse`] so the error taxonomy maps uniformly to a
//! status code and a `{"detail": ...}` body. Provider failures pass
//! through with the provider's own status and body.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::analyzer::{AnalysisError, AnalysisResult, Analyzer, ConversationInput};
use crate::config::TriageConfig;
use crate::conversation::{normalize, Conversation, NormalizeError};
use crate::fb::{ConversationSource, FetchError};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Provider conversation source.
    pub source: Arc<dyn ConversationSource>,
    /// Prompt composer + model boundary.
    pub analyzer: Analyzer,
    /// Owner name and subscription keyword used by normalization.
    pub triage: TriageConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("analyzer", &self.analyzer)
            .field("triage", &self.triage)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Response schemas
// ---------------------------------------------------------------------------

/// Envelope for the conversations listing response.
#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    /// Normalized conversations in provider order.
    pub conversations: Vec<Conversation>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// All errors that can occur in the request lifecycle.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Propagated from the conversation fetcher.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Propagated from the normalizer.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    /// Propagated from the analyzer boundary.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Fetch(FetchError::MissingAccessToken) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Value::String("Missing Facebook Access Token".to_owned()),
            ),
            // Passthrough: the provider's status and body reach the
            // caller unmodified. A JSON body stays JSON.
            ApiError::Fetch(FetchError::Upstream { status, body }) => {
                let status = StatusCode::from_u16(status)
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                let detail =
                    serde_json::from_str(&body).unwrap_or(Value::String(body));
                (status, detail)
            }
            ApiError::Fetch(e @ FetchError::Request(_)) => {
                error!(error = %e, "graph transport failure");
                (StatusCode::BAD_GATEWAY, Value::String(e.to_string()))
            }
            ApiError::Fetch(e @ FetchError::Decode(_)) => {
                error!(error = %e, "graph response decode failure");
                (StatusCode::BAD_GATEWAY, Value::String(e.to_string()))
            }
            ApiError::Normalize(e) => {
                error!(error = %e, "conversation normalization failure");
                (StatusCode::BAD_GATEWAY, Value::String(e.to_string()))
            }
            ApiError::Analysis(AnalysisError::Failed(cause)) => {
                error!(cause = %cause, "analysis failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Value::String(format!("Error analyzing messages: {cause}")),
                )
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /fb/` — fetch the Page's conversations and normalize them.
async fn get_conversations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConversationsResponse>, ApiError> {
    let payload = state.source.fetch_conversations().await?;
    let conversations = normalize(
        &payload,
        &state.triage.page_owner,
        &state.triage.subscription_keyword,
    )?;
    tracing::info!(count = conversations.len(), "conversations fetched");
    Ok(Json(ConversationsResponse { conversations }))
}

/// `POST /analyze-messages` — analyze one caller-supplied conversation.
async fn analyze_messages(
    State(state): State<Arc<AppState>>,
    Json(conversation): Json<ConversationInput>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let result = state.analyzer.analyze(&conversation).await?;
    tracing::info!(
        conversation_id = %conversation.conversation_id,
        "conversation analyzed"
    );
    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// Router builder
// ---------------------------------------------------------------------------

/// Build the application [`Router`].
///
/// The CORS layer is permissive, matching the frontend's allow-all
/// deployment.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/fb/", get(get_conversations))
        .route("/analyze-messages", post(analyze_messages))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
