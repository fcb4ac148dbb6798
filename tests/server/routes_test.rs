//! Endpoint behavior driven through the router with stubbed collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pagepulse::analyzer::{Analyzer, ModelError, TextModel};
use pagepulse::config::TriageConfig;
use pagepulse::fb::{ConversationSource, FetchError};
use pagepulse::server::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

enum StubSource {
    Payload(Value),
    MissingToken,
    Upstream(u16, String),
}

#[async_trait]
impl ConversationSource for StubSource {
    async fn fetch_conversations(&self) -> Result<Value, FetchError> {
        match self {
            StubSource::Payload(payload) => Ok(payload.clone()),
            StubSource::MissingToken => Err(FetchError::MissingAccessToken),
            StubSource::Upstream(status, body) => Err(FetchError::Upstream {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

struct FixedModel {
    reply: String,
}

#[async_trait]
impl TextModel for FixedModel {
    async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
        Ok(self.reply.clone())
    }

    fn model_id(&self) -> &str {
        "fixed"
    }
}

struct FailingModel;

#[async_trait]
impl TextModel for FailingModel {
    async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
        Err(ModelError::Unavailable("model exploded".to_owned()))
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

fn app(source: StubSource, model: Arc<dyn TextModel>) -> axum::Router {
    router(Arc::new(AppState {
        source: Arc::new(source),
        analyzer: Analyzer::new(model),
        triage: TriageConfig::default(),
    }))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

fn graph_fixture() -> Value {
    json!({
        "data": [{
            "id": "t_100",
            "messages": { "data": [
                {
                    "message": "أهلا بيكي",
                    "from": { "name": "Ai Egypt", "id": "page-1" },
                    "created_time": "2025-05-01T10:00:00+0000"
                },
                {
                    "message": "وصل النهاردة",
                    "from": { "name": "Mona", "id": "user-7" },
                    "created_time": "2025-05-02T10:00:00+0000"
                }
            ]}
        }]
    })
}

// ---------------------------------------------------------------------------
// GET /fb/
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fb_returns_normalized_conversations() {
    let app = app(
        StubSource::Payload(graph_fixture()),
        Arc::new(FixedModel {
            reply: String::new(),
        }),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/fb/")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let conversation = &body["conversations"][0];
    assert_eq!(conversation["conversation_id"], "t_100");
    assert_eq!(conversation["conversation_name"], "Mona");
    assert_eq!(
        conversation["subscription_date"],
        "2025-05-02T10:00:00+0000"
    );
    assert_eq!(
        conversation["messages"]
            .as_array()
            .expect("messages array")
            .len(),
        2
    );
    assert_eq!(conversation["messages"][1]["user_id"], "user-7");
}

#[tokio::test]
async fn fb_without_token_reports_missing_credential() {
    let app = app(
        StubSource::MissingToken,
        Arc::new(FixedModel {
            reply: String::new(),
        }),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/fb/")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Missing Facebook Access Token");
}

#[tokio::test]
async fn fb_passes_provider_status_and_body_through() {
    let app = app(
        StubSource::Upstream(
            400,
            r#"{"error":{"message":"Invalid OAuth access token","code":190}}"#.to_owned(),
        ),
        Arc::new(FixedModel {
            reply: String::new(),
        }),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/fb/")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["detail"]["error"]["message"], "Invalid OAuth access token");
    assert_eq!(body["detail"]["error"]["code"], 190);
}

#[tokio::test]
async fn fb_with_malformed_payload_is_a_bad_gateway() {
    // A message record without created_time fails the typed decode.
    let payload = json!({
        "data": [{
            "id": "t_1",
            "messages": { "data": [
                { "message": "hi", "from": { "name": "Mona", "id": "2" } }
            ]}
        }]
    });
    let app = app(
        StubSource::Payload(payload),
        Arc::new(FixedModel {
            reply: String::new(),
        }),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/fb/")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(body["detail"]
        .as_str()
        .expect("detail string")
        .contains("malformed"));
}

// ---------------------------------------------------------------------------
// POST /analyze-messages
// ---------------------------------------------------------------------------

fn analyze_request() -> Request<Body> {
    let payload = json!({
        "conversation_id": "t_100",
        "messages": [
            { "message": "عايز أشترك", "sender": "Omar", "created_time": "2025-05-01T10:00:00+0000" }
        ]
    });
    Request::builder()
        .method("POST")
        .uri("/analyze-messages")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

#[tokio::test]
async fn analyze_wraps_model_reply_verbatim() {
    let app = app(
        StubSource::MissingToken,
        Arc::new(FixedModel {
            reply: "X".to_owned(),
        }),
    );

    let response = app.oneshot(analyze_request()).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({ "analysis": "X" }));
}

#[tokio::test]
async fn analyze_failure_reports_wrapped_cause() {
    let app = app(StubSource::MissingToken, Arc::new(FailingModel));

    let response = app.oneshot(analyze_request()).await.expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    let detail = body["detail"].as_str().expect("detail string");
    assert!(detail.starts_with("Error analyzing messages:"));
    assert!(detail.contains("model exploded"));
}
