use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::de::IgnoredAny;

use super::{ChunkProcessor, StreamState};
use crate::convert::response::generate_id;
use crate::error::LlmError;
use crate::metadata::StreamMetadataExtractor;
use crate::protocol::chat::{CompatChatChunk, CompatToolCallDelta};
use crate::types::{StreamPart, ToolCall};

/// Tool call being assembled from deltas
#[derive(Debug, Clone)]
struct ToolCallSlot {
    id: String,
    name: String,
    arguments: String,
    finished: bool,
}

/// Reconstructs text, reasoning and tool calls from chat chunks
///
/// Tool-call fragments are accumulated per vendor index (slot 0 when the
/// vendor omits it). A slot completes the first time its buffer parses as
/// JSON; later fragments still produce deltas but never a second completion.
pub struct ChatStreamProcessor {
    state: StreamState,
    tool_calls: BTreeMap<u32, ToolCallSlot>,
}

impl ChatStreamProcessor {
    /// Processor with an optional metadata accumulator
    pub fn new(extractor: Option<Box<dyn StreamMetadataExtractor>>) -> Self {
        Self {
            state: StreamState::new(extractor),
            tool_calls: BTreeMap::new(),
        }
    }

    fn tool_call_delta(&mut self, delta: CompatToolCallDelta) -> Result<Vec<StreamPart>, LlmError> {
        let index = delta.index.unwrap_or(0);
        let function = delta.function.unwrap_or_default();

        let slot = match self.tool_calls.entry(index) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                if delta.call_type.as_deref() != Some("function") {
                    return Err(LlmError::invalid_response(format!(
                        "tool call delta {index}: expected 'function' type"
                    )));
                }
                let Some(name) = function.name else {
                    return Err(LlmError::invalid_response(format!(
                        "tool call delta {index}: expected 'function.name' to be a string"
                    )));
                };
                entry.insert(ToolCallSlot {
                    id: delta.id.unwrap_or_else(generate_id),
                    name,
                    arguments: String::new(),
                    finished: false,
                })
            }
        };

        let fragment = function.arguments.unwrap_or_default();
        slot.arguments.push_str(&fragment);

        let mut parts = vec![StreamPart::ToolCallDelta {
            tool_call_id: slot.id.clone(),
            tool_name: slot.name.clone(),
            args_text_delta: fragment,
        }];

        if !slot.finished && is_complete_json(&slot.arguments) {
            slot.finished = true;
            parts.push(StreamPart::ToolCall(ToolCall {
                tool_call_id: slot.id.clone(),
                tool_name: slot.name.clone(),
                args: slot.arguments.clone(),
            }));
        }

        Ok(parts)
    }
}

impl ChunkProcessor for ChatStreamProcessor {
    fn process(&mut self, data: &str) -> Vec<Result<StreamPart, LlmError>> {
        let mut parts = Vec::new();
        let Some(chunk) = self.state.decode::<CompatChatChunk>(data, &mut parts) else {
            return parts;
        };

        self.state.begin(chunk.id, chunk.model, chunk.created, &mut parts);
        self.state.record_usage(chunk.usage);

        let Some(choice) = chunk.choices.into_iter().next() else {
            return parts;
        };
        self.state.record_finish_reason(choice.finish_reason.as_deref());

        let Some(delta) = choice.delta else {
            return parts;
        };

        if let Some(reasoning) = delta.reasoning_content {
            parts.push(Ok(StreamPart::ReasoningDelta { delta: reasoning }));
        }
        if let Some(content) = delta.content {
            parts.push(Ok(StreamPart::TextDelta { delta: content }));
        }

        for tool_delta in delta.tool_calls.unwrap_or_default() {
            match self.tool_call_delta(tool_delta) {
                Ok(tool_parts) => parts.extend(tool_parts.into_iter().map(Ok)),
                Err(e) => {
                    parts.push(Err(e));
                    break;
                }
            }
        }

        parts
    }

    fn flush(&mut self) -> StreamPart {
        self.state.flush()
    }
}

fn is_complete_json(text: &str) -> bool {
    serde_json::from_str::<IgnoredAny>(text).is_ok()
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::super::reconstruct;
    use super::super::test_support::{collect, events};
    use super::*;
    use crate::metadata::{MetadataExtractor, ResponseFieldExtractor};
    use crate::types::{FinishReason, Usage};

    async fn run(chunks: &[Value]) -> Vec<Result<StreamPart, LlmError>> {
        let payloads: Vec<String> = chunks.iter().map(Value::to_string).collect();
        let refs: Vec<&str> = payloads.iter().map(String::as_str).collect();
        collect(reconstruct(events(&refs), ChatStreamProcessor::new(None), None)).await
    }

    fn ok_parts(items: Vec<Result<StreamPart, LlmError>>) -> Vec<StreamPart> {
        items.into_iter().map(Result::unwrap).collect()
    }

    fn text(delta: &str) -> StreamPart {
        StreamPart::TextDelta {
            delta: delta.to_owned(),
        }
    }

    fn tool_delta(index: u32, id: Option<&str>, name: Option<&str>, arguments: &str) -> Value {
        let mut delta = json!({"index": index, "function": {"arguments": arguments}});
        if let Some(id) = id {
            delta["id"] = json!(id);
            delta["type"] = json!("function");
        }
        if let Some(name) = name {
            delta["function"]["name"] = json!(name);
        }
        json!({"choices": [{"delta": {"tool_calls": [delta]}}]})
    }

    #[tokio::test]
    async fn text_stream_with_usage() {
        let parts = ok_parts(
            run(&[
                json!({"id": "c1", "model": "m", "created": 1_700_000_000, "choices": [{"delta": {"role": "assistant", "content": "Hel"}}]}),
                json!({"choices": [{"delta": {"content": "lo"}}]}),
                json!({"choices": [{"delta": {}, "finish_reason": "stop"}], "usage": {"prompt_tokens": 3, "completion_tokens": 2}}),
            ])
            .await,
        );

        assert_eq!(parts.len(), 4);
        let StreamPart::ResponseMetadata(metadata) = &parts[0] else {
            panic!("expected metadata first, got {:?}", parts[0]);
        };
        assert_eq!(metadata.id.as_deref(), Some("c1"));
        assert_eq!(metadata.model_id.as_deref(), Some("m"));
        assert_eq!(parts[1], text("Hel"));
        assert_eq!(parts[2], text("lo"));
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
    }

    #[tokio::test]
    async fn invalid_chunk_yields_error_and_errored_finish() {
        let items = run(&[json!({"unexpected": true})]).await;
        let parts = ok_parts(items);

        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[0], StreamPart::Error { .. }));
        assert!(matches!(
            parts[1],
            StreamPart::Finish {
                finish_reason: FinishReason::Error,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn non_json_chunk_keeps_stream_alive() {
        let valid = json!({"choices": [{"delta": {"content": "ok"}}]}).to_string();
        let items = collect(reconstruct(
            events(&["{not json", valid.as_str()]),
            ChatStreamProcessor::new(None),
            None,
        ))
        .await;
        let parts = ok_parts(items);

        assert!(matches!(parts[0], StreamPart::Error { .. }));
        assert!(matches!(parts[1], StreamPart::ResponseMetadata(_)));
        assert_eq!(parts[2], text("ok"));
        assert!(matches!(
            parts[3],
            StreamPart::Finish {
                finish_reason: FinishReason::Error,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn later_finish_reason_overrides_error() {
        let parts = ok_parts(
            run(&[
                json!({"error": {"message": "transient"}}),
                json!({"choices": [{"delta": {"content": "x"}, "finish_reason": "length"}]}),
            ])
            .await,
        );

        assert_eq!(parts[0], StreamPart::Error { message: "transient".to_owned() });
        assert!(matches!(
            parts.last(),
            Some(StreamPart::Finish {
                finish_reason: FinishReason::Length,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn reasoning_precedes_text_within_chunk() {
        let parts = ok_parts(run(&[json!({"choices": [{"delta": {"reasoning_content": "hmm", "content": "42"}}]})]).await);

        assert_eq!(
            parts[1],
            StreamPart::ReasoningDelta {
                delta: "hmm".to_owned()
            }
        );
        assert_eq!(parts[2], text("42"));
    }

    #[tokio::test]
    async fn tool_call_is_assembled_from_fragments() {
        let parts = ok_parts(
            run(&[
                tool_delta(0, Some("call_1"), Some("weather"), ""),
                tool_delta(0, None, None, "{\"city\":"),
                tool_delta(0, None, None, "\"Paris\"}"),
                json!({"choices": [{"delta": {}, "finish_reason": "tool_calls"}]}),
            ])
            .await,
        );

        let deltas: Vec<&str> = parts
            .iter()
            .filter_map(|part| match part {
                StreamPart::ToolCallDelta { args_text_delta, .. } => Some(args_text_delta.as_str()),
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
        assert_eq!(
            calls,
            [&ToolCall {
                tool_call_id: "call_1".to_owned(),
                tool_name: "weather".to_owned(),
                args: "{\"city\":\"Paris\"}".to_owned(),
            }]
        );

        assert!(matches!(
            parts.last(),
            Some(StreamPart::Finish {
                finish_reason: FinishReason::ToolCalls,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn tool_call_completes_in_first_chunk() {
        let parts = ok_parts(run(&[tool_delta(0, Some("call_1"), Some("noop"), "{}")]).await);

        assert!(matches!(parts[1], StreamPart::ToolCallDelta { .. }));
        assert!(matches!(&parts[2], StreamPart::ToolCall(call) if call.args == "{}"));
    }

    #[tokio::test]
    async fn finished_slot_never_completes_twice() {
        let parts = ok_parts(
            run(&[
                tool_delta(0, Some("call_1"), Some("noop"), "{}"),
                tool_delta(0, None, None, " "),
                tool_delta(0, None, None, ""),
            ])
            .await,
        );

        let completions = parts.iter().filter(|p| matches!(p, StreamPart::ToolCall(_))).count();
        let deltas = parts
            .iter()
            .filter(|p| matches!(p, StreamPart::ToolCallDelta { .. }))
            .count();
        assert_eq!(completions, 1);
        assert_eq!(deltas, 3);
    }

    #[tokio::test]
    async fn parallel_tool_calls_use_separate_slots() {
        let parts = ok_parts(
            run(&[
                tool_delta(0, Some("call_a"), Some("a"), "{\"x\":"),
                tool_delta(1, Some("call_b"), Some("b"), "{\"y\":2}"),
                tool_delta(0, None, None, "1}"),
            ])
            .await,
        );

        let calls: Vec<(&str, &str)> = parts
            .iter()
            .filter_map(|part| match part {
                StreamPart::ToolCall(call) => Some((call.tool_call_id.as_str(), call.args.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(calls, [("call_b", "{\"y\":2}"), ("call_a", "{\"x\":1}")]);
    }

    #[tokio::test]
    async fn missing_tool_id_is_generated() {
        let parts = ok_parts(
            run(&[json!({"choices": [{"delta": {"tool_calls": [{"type": "function", "function": {"name": "noop", "arguments": "{}"}}]}}]})])
                .await,
        );

        let StreamPart::ToolCall(call) = &parts[2] else {
            panic!("expected tool call, got {:?}", parts[2]);
        };
        assert_eq!(call.tool_call_id.len(), 32);
    }

    #[tokio::test]
    async fn malformed_first_tool_delta_is_fatal() {
        let items = run(&[
            json!({"choices": [{"delta": {"content": "before"}}]}),
            json!({"choices": [{"delta": {"tool_calls": [{"index": 0, "type": "function", "function": {"arguments": "{}"}}]}}]}),
            json!({"choices": [{"delta": {"content": "after"}}]}),
        ])
        .await;

        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], Ok(StreamPart::ResponseMetadata(_))));
        assert!(matches!(&items[1], Ok(StreamPart::TextDelta { delta }) if delta == "before"));
        assert!(matches!(items[2], Err(LlmError::InvalidResponseData { .. })));
    }

    #[tokio::test]
    async fn non_function_tool_type_is_fatal() {
        let items = run(&[json!({"choices": [{"delta": {"tool_calls": [{"index": 0, "type": "retrieval", "function": {"name": "x"}}]}}]})]).await;

        assert!(matches!(items.last(), Some(Err(LlmError::InvalidResponseData { .. }))));
        assert!(!items.iter().any(|item| matches!(item, Ok(StreamPart::Finish { .. }))));
    }

    #[tokio::test]
    async fn finish_carries_extracted_metadata() {
        let extractor = ResponseFieldExtractor::new("vendor", ["system_fingerprint"]);
        let chunk = json!({"system_fingerprint": "fp_9", "choices": [{"delta": {"content": "hi"}}]});

        let items = collect(reconstruct(
            events(&[chunk.to_string().as_str()]),
            ChatStreamProcessor::new(Some(extractor.create_stream_extractor())),
            None,
        ))
        .await;

        let Some(Ok(StreamPart::Finish { provider_metadata, .. })) = items.last() else {
            panic!("expected finish last");
        };
        let metadata = provider_metadata.as_ref().unwrap();
        assert_eq!(metadata["vendor"]["system_fingerprint"], json!("fp_9"));
    }

    #[tokio::test]
    async fn later_usage_replaces_earlier_usage() {
        let parts = ok_parts(
            run(&[
                json!({"choices": [{"delta": {"content": "a"}}], "usage": {"prompt_tokens": 7, "completion_tokens": 1}}),
                json!({"choices": [{"delta": {"content": "b"}}], "usage": {"completion_tokens": 2}}),
            ])
            .await,
        );

        let Some(StreamPart::Finish { usage, .. }) = parts.last() else {
            panic!("expected finish last");
        };
        assert_eq!(
            *usage,
            Usage {
                prompt_tokens: None,
                completion_tokens: Some(2),
            }
        );
    }

    #[tokio::test]
    async fn unreported_usage_stays_unmeasured() {
        let parts = ok_parts(run(&[json!({"choices": [{"delta": {"content": "a"}, "finish_reason": "stop"}]})]).await);

        let Some(StreamPart::Finish { usage, .. }) = parts.last() else {
            panic!("expected finish last");
        };
        assert_eq!(*usage, Usage::default());
        assert!(usage.prompt_tokens.is_none());
        assert!(usage.completion_tokens.is_none());
    }
}
