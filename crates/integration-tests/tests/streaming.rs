mod harness;

use std::sync::Arc;

use compat_llm::types::{FinishReason, ToolCall, Usage};
use compat_llm::{CallOptions, ChatSettings, LanguageModel, LlmError, Message, ResponseFieldExtractor, StreamPart};
use futures_util::StreamExt;
use harness::mock_vendor::{MockVendor, Reply};
use harness::{collect_parts, provider, provider_with, streamed_text};
use http::StatusCode;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

fn text_chunks() -> Vec<Value> {
    vec![
        json!({
            "id": "chatcmpl-s1",
            "created": 1_700_000_000,
            "model": "mock-model",
            "choices": [{"index": 0, "delta": {"role": "assistant", "content": "Hel"}}]
        }),
        json!({"id": "chatcmpl-s1", "choices": [{"index": 0, "delta": {"content": "lo"}}]}),
        json!({
            "id": "chatcmpl-s1",
            "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2}
        }),
    ]
}

#[tokio::test]
async fn text_stream_is_reconstructed_in_order() {
    let mock = MockVendor::start(Reply::chunks(&text_chunks())).await.unwrap();
    let model = provider(&mock.base_url()).chat_model("mock-model", ChatSettings::default());

    let result = model
        .do_stream(CallOptions::new(vec![Message::user_text("Hi")]))
        .await
        .unwrap();
    assert_eq!(
        result.raw_response.headers.get("content-type").unwrap(),
        "text/event-stream"
    );

    let parts = collect_parts(result.stream).await;
    assert_eq!(parts.len(), 4);

    let StreamPart::ResponseMetadata(metadata) = &parts[0] else {
        panic!("expected metadata first, got {:?}", parts[0]);
    };
    assert_eq!(metadata.id.as_deref(), Some("chatcmpl-s1"));
    assert_eq!(metadata.model_id.as_deref(), Some("mock-model"));
    assert_eq!(streamed_text(&parts), "Hello");
    assert_eq!(
        parts[3],
        StreamPart::Finish {
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens: Some(3),
                completion_tokens: Some(2),
            },
            provider_metadata: None,
        }
    );

    let body = mock.single_request().body;
    assert_eq!(body["stream"], true);
    assert!(body.get("stream_options").is_none());
}

#[tokio::test]
async fn include_usage_requests_stream_options() {
    let mock = MockVendor::start(Reply::chunks(&text_chunks())).await.unwrap();
    let provider = provider_with(&mock.base_url(), |settings| settings.include_usage = true);
    let model = provider.chat_model("mock-model", ChatSettings::default());

    let result = model
        .do_stream(CallOptions::new(vec![Message::user_text("Hi")]))
        .await
        .unwrap();
    collect_parts(result.stream).await;

    assert_eq!(
        mock.single_request().body["stream_options"],
        json!({"include_usage": true})
    );
}

#[tokio::test]
async fn tool_call_arguments_are_reassembled() {
    let chunks = [
        json!({"id": "chatcmpl-t", "choices": [{"delta": {"role": "assistant", "tool_calls": [{
            "index": 0, "id": "call_1", "type": "function",
            "function": {"name": "get_weather", "arguments": ""}
        }]}}]}),
        json!({"choices": [{"delta": {"tool_calls": [{"index": 0, "function": {"arguments": "{\"city\":"}}]}}]}),
        json!({"choices": [{"delta": {"tool_calls": [{"index": 0, "function": {"arguments": "\"Paris\"}"}}]}}]}),
        json!({"choices": [{"delta": {}, "finish_reason": "tool_calls"}]}),
    ];
    let mock = MockVendor::start(Reply::chunks(&chunks)).await.unwrap();
    let model = provider(&mock.base_url()).chat_model("mock-model", ChatSettings::default());

    let result = model
        .do_stream(CallOptions::new(vec![Message::user_text("Weather?")]))
        .await
        .unwrap();
    let parts = collect_parts(result.stream).await;

    let deltas: Vec<&str> = parts
        .iter()
        .filter_map(|part| match part {
            StreamPart::ToolCallDelta {
                tool_call_id,
                tool_name,
                args_text_delta,
            } => {
                assert_eq!(tool_call_id, "call_1");
                assert_eq!(tool_name, "get_weather");
                Some(args_text_delta.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(deltas, ["", "{\"city\":", "\"Paris\"}"]);

    let calls: Vec<&ToolCall> = parts
        .iter()
        .filter_map(|part| match part {
            StreamPart::ToolCall(call) => Some(call),
            _ => None,
        })
        .collect();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args, "{\"city\":\"Paris\"}");

    // The completed call comes right after the delta that closed it
    let call_position = parts
        .iter()
        .position(|part| matches!(part, StreamPart::ToolCall(_)))
        .unwrap();
    assert!(matches!(
        &parts[call_position - 1],
        StreamPart::ToolCallDelta { args_text_delta, .. } if args_text_delta == "\"Paris\"}"
    ));

    assert!(matches!(
        parts.last(),
        Some(StreamPart::Finish {
            finish_reason: FinishReason::ToolCalls,
            ..
        })
    ));
}

#[tokio::test]
async fn malformed_tool_delta_ends_stream_with_error() {
    let chunks = [json!({"choices": [{"delta": {"tool_calls": [{
        "index": 0, "id": "call_1", "type": "function", "function": {"arguments": "{}"}
    }]}}]})];
    let mock = MockVendor::start(Reply::chunks(&chunks)).await.unwrap();
    let model = provider(&mock.base_url()).chat_model("mock-model", ChatSettings::default());

    let result = model
        .do_stream(CallOptions::new(vec![Message::user_text("Hi")]))
        .await
        .unwrap();
    let items: Vec<Result<StreamPart, LlmError>> = result.stream.collect().await;

    assert!(matches!(items.first(), Some(Ok(StreamPart::ResponseMetadata(_)))));
    assert!(matches!(
        items.last(),
        Some(Err(LlmError::InvalidResponseData { .. }))
    ));
    assert!(
        !items
            .iter()
            .any(|item| matches!(item, Ok(StreamPart::Finish { .. })))
    );
}

#[tokio::test]
async fn vendor_error_chunk_marks_finish_as_error() {
    let chunks = [
        json!({"id": "c", "choices": [{"delta": {"content": "partial"}}]}),
        json!({"error": {"message": "context length exceeded", "type": "invalid_request_error"}}),
    ];
    let mock = MockVendor::start(Reply::chunks(&chunks)).await.unwrap();
    let model = provider(&mock.base_url()).chat_model("mock-model", ChatSettings::default());

    let result = model
        .do_stream(CallOptions::new(vec![Message::user_text("Hi")]))
        .await
        .unwrap();
    let parts = collect_parts(result.stream).await;

    assert_eq!(streamed_text(&parts), "partial");
    assert!(parts.contains(&StreamPart::Error {
        message: "context length exceeded".to_owned()
    }));
    assert!(matches!(
        parts.last(),
        Some(StreamPart::Finish {
            finish_reason: FinishReason::Error,
            ..
        })
    ));
}

#[tokio::test]
async fn invalid_json_chunk_is_reported_and_stream_continues() {
    let mock = MockVendor::start(Reply::Events(vec![
        "{not json".to_owned(),
        json!({"id": "c", "choices": [{"delta": {"content": "after"}}]}).to_string(),
    ]))
    .await
    .unwrap();
    let model = provider(&mock.base_url()).chat_model("mock-model", ChatSettings::default());

    let result = model
        .do_stream(CallOptions::new(vec![Message::user_text("Hi")]))
        .await
        .unwrap();
    let parts = collect_parts(result.stream).await;

    assert!(matches!(parts[0], StreamPart::Error { .. }));
    assert_eq!(streamed_text(&parts), "after");
    assert!(matches!(
        parts.last(),
        Some(StreamPart::Finish {
            finish_reason: FinishReason::Error,
            ..
        })
    ));
}

#[tokio::test]
async fn stream_request_errors_before_any_part() {
    let mock = MockVendor::start(Reply::vendor_error(StatusCode::TOO_MANY_REQUESTS, "slow down"))
        .await
        .unwrap();
    let model = provider(&mock.base_url()).chat_model("mock-model", ChatSettings::default());

    let Err(err) = model
        .do_stream(CallOptions::new(vec![Message::user_text("Hi")]))
        .await
    else {
        panic!("expected the stream request to fail");
    };

    assert!(err.is_retryable());
    assert!(matches!(err, LlmError::ApiCall { status, .. } if status == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn simulated_stream_matches_generate() {
    let response = json!({
        "id": "chatcmpl-sim",
        "created": 1_700_000_000,
        "model": "mock-model",
        "choices": [{"message": {"role": "assistant", "content": "Hello there"}, "finish_reason": "length"}],
        "usage": {"prompt_tokens": 4, "completion_tokens": 2}
    });
    // Served only if the vendor is asked to stream
    let events = vec![json!({"choices": [{"delta": {"content": "streamed"}}]}).to_string()];
    let mock = MockVendor::start(Reply::Both { json: response, events }).await.unwrap();
    let model = provider(&mock.base_url()).chat_model(
        "mock-model",
        ChatSettings {
            simulate_streaming: true,
            ..ChatSettings::default()
        },
    );

    let generated = model
        .do_generate(CallOptions::new(vec![Message::user_text("Hi")]))
        .await
        .unwrap();
    let streamed = model
        .do_stream(CallOptions::new(vec![Message::user_text("Hi")]))
        .await
        .unwrap();
    let parts = collect_parts(streamed.stream).await;

    assert_eq!(Some(streamed_text(&parts)), generated.text);
    assert_eq!(parts[0], StreamPart::ResponseMetadata(generated.response.clone()));
    assert_eq!(
        parts.last(),
        Some(&StreamPart::Finish {
            finish_reason: FinishReason::Length,
            usage: generated.usage,
            provider_metadata: None,
        })
    );

    // Simulated streams never ask the vendor to stream
    for request in mock.requests() {
        assert!(request.body.get("stream").is_none());
    }
}

#[tokio::test]
async fn stream_metadata_extractor_collects_fields() {
    let chunks = [
        json!({"id": "c", "system_fingerprint": "fp_a", "choices": [{"delta": {"content": "x"}}]}),
        json!({"system_fingerprint": "fp_b", "choices": [{"delta": {}, "finish_reason": "stop"}]}),
    ];
    let mock = MockVendor::start(Reply::chunks(&chunks)).await.unwrap();
    let provider = provider_with(&mock.base_url(), |settings| {
        settings.metadata_extractor = Some(Arc::new(ResponseFieldExtractor::new(
            "mock",
            ["system_fingerprint".to_owned()],
        )));
    });
    let model = provider.chat_model("mock-model", ChatSettings::default());

    let result = model
        .do_stream(CallOptions::new(vec![Message::user_text("Hi")]))
        .await
        .unwrap();
    let parts = collect_parts(result.stream).await;

    let Some(StreamPart::Finish {
        provider_metadata: Some(metadata),
        ..
    }) = parts.last()
    else {
        panic!("expected finish with provider metadata, got {:?}", parts.last());
    };
    assert_eq!(metadata["mock"]["system_fingerprint"], "fp_b");
}

#[tokio::test]
async fn fired_abort_prevents_the_request() {
    let mock = MockVendor::start(Reply::chunks(&text_chunks())).await.unwrap();
    let model = provider(&mock.base_url()).chat_model("mock-model", ChatSettings::default());

    let abort = CancellationToken::new();
    abort.cancel();
    let options = CallOptions {
        abort: Some(abort),
        ..CallOptions::new(vec![Message::user_text("Hi")])
    };

    let Err(err) = model.do_stream(options).await else {
        panic!("expected the aborted call to fail");
    };
    assert!(matches!(err, LlmError::Aborted));
}
