//! Non-streaming vendor responses to normalized results

use jiff::Timestamp;

use super::map_finish_reason;
use crate::error::LlmError;
use crate::protocol::CompatUsage;
use crate::protocol::chat::CompatChatResponse;
use crate::protocol::completion::CompatCompletionResponse;
use crate::types::{FinishReason, ResponseMetadata, ToolCall, Usage};

/// Content extracted from a non-streaming response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResponse {
    /// Generated text
    pub text: Option<String>,
    /// Reasoning text
    pub reasoning: Option<String>,
    /// Requested tool calls
    pub tool_calls: Vec<ToolCall>,
    /// Why generation stopped
    pub finish_reason: FinishReason,
    /// Token usage
    pub usage: Usage,
    /// Response identity
    pub response: ResponseMetadata,
}

/// Decode the first choice of a chat response
pub fn decode_chat_response(response: CompatChatResponse) -> Result<DecodedResponse, LlmError> {
    let metadata = response_metadata(response.id, response.model, response.created);
    let usage = usage_from(response.usage);
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::invalid_response("response contains no choices"))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            tool_call_id: call.id.unwrap_or_else(generate_id),
            tool_name: call.function.name,
            args: call.function.arguments,
        })
        .collect();

    Ok(DecodedResponse {
        text: choice.message.content,
        reasoning: choice.message.reasoning_content,
        tool_calls,
        finish_reason: map_finish_reason(choice.finish_reason.as_deref()),
        usage,
        response: metadata,
    })
}

/// Decode the first choice of a completion response
pub fn decode_completion_response(response: CompatCompletionResponse) -> Result<DecodedResponse, LlmError> {
    let metadata = response_metadata(response.id, response.model, response.created);
    let usage = usage_from(response.usage);
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::invalid_response("response contains no choices"))?;

    Ok(DecodedResponse {
        text: choice.text,
        reasoning: None,
        tool_calls: Vec::new(),
        finish_reason: map_finish_reason(choice.finish_reason.as_deref()),
        usage,
        response: metadata,
    })
}

/// Response identity from the optional `id`, `model` and `created` fields
///
/// A `created` value outside the representable range is treated as absent.
pub fn response_metadata(id: Option<String>, model: Option<String>, created: Option<i64>) -> ResponseMetadata {
    ResponseMetadata {
        id,
        model_id: model,
        timestamp: created.and_then(|seconds| Timestamp::from_second(seconds).ok()),
    }
}

/// Usage counters, absent when the vendor did not report them
pub fn usage_from(usage: Option<CompatUsage>) -> Usage {
    usage.map_or_else(Usage::default, |usage| Usage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
    })
}

/// Fresh identifier for tool calls the vendor left unnamed
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
