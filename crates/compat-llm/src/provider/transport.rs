//! HTTP plumbing shared by the chat and completion façades

use std::future::Future;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::config::ModelConfig;
use crate::error::LlmError;
use crate::protocol::CompatErrorResponse;
use crate::stream::EventStream;
use crate::types::RawCall;

/// Decodes the vendor's error body for non-2xx responses
pub trait ErrorStructure: Send + Sync {
    /// Human-readable message from the raw body, if the body has the expected shape
    fn message(&self, body: &str) -> Option<String>;

    /// Whether a response with this status may succeed on retry
    fn is_retryable(&self, status: StatusCode) -> bool {
        matches!(status.as_u16(), 408 | 409 | 429) || status.is_server_error()
    }
}

/// Error structure for `{ "error": { "message": ... } }` bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorStructure;

impl ErrorStructure for DefaultErrorStructure {
    fn message(&self, body: &str) -> Option<String> {
        serde_json::from_str::<CompatErrorResponse>(body)
            .ok()
            .map(|response| response.error.message)
    }
}

/// Serialize a request body, keeping the split form for debugging
pub(crate) fn serialize_body<T: Serialize>(body: &T) -> Result<(String, RawCall), LlmError> {
    let value = serde_json::to_value(body).map_err(|e| LlmError::Internal(e.into()))?;
    Ok((value.to_string(), RawCall::from_body(&value)))
}

/// Run `future` unless `abort` fires first
pub(crate) async fn with_abort<T>(
    abort: Option<&CancellationToken>,
    future: impl Future<Output = Result<T, LlmError>>,
) -> Result<T, LlmError> {
    match abort {
        Some(token) => tokio::select! {
            () = token.cancelled() => Err(LlmError::Aborted),
            result = future => result,
        },
        None => future.await,
    }
}

/// POST a JSON body and fail on non-2xx statuses
///
/// Call headers override configured headers with the same name.
pub(crate) async fn post_json(
    config: &ModelConfig,
    url: &str,
    call_headers: &HeaderMap,
    body: String,
) -> Result<reqwest::Response, LlmError> {
    let mut headers = (config.headers)();
    headers.extend(call_headers.clone());
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let response = config
        .client
        .post(url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            tracing::error!(provider = %config.provider, error = %e, "upstream request failed");
            LlmError::Upstream(e.to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = config
            .error_structure
            .message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned());
        tracing::warn!(
            provider = %config.provider,
            status = %status,
            message = %message,
            "upstream returned error"
        );
        return Err(LlmError::ApiCall {
            status,
            message,
            retryable: config.error_structure.is_retryable(status),
            body,
        });
    }

    Ok(response)
}

/// Read a JSON body as both a raw value and a typed response
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<(HeaderMap, Value, T), LlmError> {
    let headers = response.headers().clone();
    let text = response
        .text()
        .await
        .map_err(|e| LlmError::Upstream(format!("failed to read response: {e}")))?;

    let raw: Value = serde_json::from_str(&text)
        .map_err(|e| LlmError::invalid_response(format!("response is not JSON: {e}")))?;
    let typed = T::deserialize(&raw)
        .map_err(|e| LlmError::invalid_response(format!("unexpected response shape: {e}")))?;

    Ok((headers, raw, typed))
}

/// `data:` payloads of a server-sent event response
pub(crate) fn event_data(response: reqwest::Response) -> EventStream {
    response
        .bytes_stream()
        .eventsource()
        .map(|result| {
            result
                .map(|event| event.data)
                .map_err(|e| LlmError::Streaming(e.to_string()))
        })
        .boxed()
}
