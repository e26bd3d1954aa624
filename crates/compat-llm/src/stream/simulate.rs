use futures_util::{StreamExt, stream};

use crate::types::{GenerateResult, PartStream, StreamPart};

/// Replay a finished generation as a part stream
///
/// Emits metadata, then reasoning and text as single deltas when non-empty,
/// then each tool call, then the finish part.
pub fn simulate_stream(result: &GenerateResult) -> PartStream {
    let mut parts = vec![StreamPart::ResponseMetadata(result.response.clone())];

    if let Some(reasoning) = result.reasoning.as_ref().filter(|r| !r.is_empty()) {
        parts.push(StreamPart::ReasoningDelta {
            delta: reasoning.clone(),
        });
    }
    if let Some(text) = result.text.as_ref().filter(|t| !t.is_empty()) {
        parts.push(StreamPart::TextDelta { delta: text.clone() });
    }
    parts.extend(result.tool_calls.iter().cloned().map(StreamPart::ToolCall));
    parts.push(StreamPart::Finish {
        finish_reason: result.finish_reason,
        usage: result.usage,
        provider_metadata: result.provider_metadata.clone(),
    });

    stream::iter(parts.into_iter().map(Ok)).boxed()
}
