//! Mock OpenAI-compatible vendor for integration tests
//!
//! Serves a scripted reply on `/v1/chat/completions` and `/v1/completions`
//! and records every request it receives.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// What the mock answers with
#[derive(Debug, Clone)]
pub enum Reply {
    /// A JSON body with status 200
    Json(Value),
    /// Server-sent events, one `data:` line per payload, followed by `[DONE]`
    Events(Vec<String>),
    /// JSON for non-streaming requests, events for streaming ones
    Both { json: Value, events: Vec<String> },
    /// A non-2xx status with a raw body
    Error { status: StatusCode, body: String },
}

impl Reply {
    /// Events from JSON chunks
    pub fn chunks(chunks: &[Value]) -> Self {
        Self::Events(chunks.iter().map(Value::to_string).collect())
    }

    /// Vendor error with the usual `{ "error": { ... } }` body
    pub fn vendor_error(status: StatusCode, message: &str) -> Self {
        Self::Error {
            status,
            body: serde_json::json!({"error": {"message": message, "type": "invalid_request_error"}}).to_string(),
        }
    }
}

/// One request seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Mock vendor bound to an ephemeral local port
pub struct MockVendor {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    reply: Reply,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockVendor {
    /// Start the mock server, returning once it is listening
    pub async fn start(reply: Reply) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            reply,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle))
            .route("/v1/completions", routing::post(handle))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL including `/v1`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// The only request received, panicking otherwise
    pub fn single_request(&self) -> RecordedRequest {
        let mut requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.remove(0)
    }
}

impl Drop for MockVendor {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle(State(state): State<Arc<MockState>>, uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let streaming = body.get("stream").and_then(Value::as_bool).unwrap_or(false);

    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        headers,
        body,
    });

    match &state.reply {
        Reply::Json(json) => Json(json.clone()).into_response(),
        Reply::Events(events) => sse(events),
        Reply::Both { json, events } => {
            if streaming {
                sse(events)
            } else {
                Json(json.clone()).into_response()
            }
        }
        Reply::Error { status, body } => {
            (*status, [(header::CONTENT_TYPE, "application/json")], body.clone()).into_response()
        }
    }
}

fn sse(events: &[String]) -> Response {
    let mut body = String::new();
    for event in events {
        body.push_str("data: ");
        body.push_str(event);
        body.push_str("\n\n");
    }
    body.push_str("data: [DONE]\n\n");

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}
