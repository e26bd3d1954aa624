use http::HeaderMap;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::prompt::ProviderMetadata;
use super::stream::PartStream;

/// Normalized reason generation stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    /// Natural stop or stop sequence
    Stop,
    /// Token limit reached
    Length,
    /// Model requested tool calls
    ToolCalls,
    /// Stream carried an error
    Error,
    /// Vendor gave no recognized reason
    #[default]
    Unknown,
}

/// Token usage as reported by the vendor
///
/// `None` means the vendor did not report the counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: Option<u64>,
    /// Tokens in the completion
    pub completion_tokens: Option<u64>,
}

/// Identity of a vendor response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Vendor response id
    pub id: Option<String>,
    /// Model that produced the response
    pub model_id: Option<String>,
    /// When the response was created
    pub timestamp: Option<Timestamp>,
}

/// Completed tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier
    pub tool_call_id: String,
    /// Name of the called tool
    pub tool_name: String,
    /// Arguments as a JSON text
    pub args: String,
}

/// Non-fatal notice about an ignored setting or tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Warning {
    /// Call setting the vendor does not support
    UnsupportedSetting {
        /// Setting name
        setting: String,
        /// Extra explanation
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    /// Tool the vendor cannot represent
    UnsupportedTool {
        /// Tool name
        tool: String,
        /// Extra explanation
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    /// Anything else
    Other {
        /// Notice text
        message: String,
    },
}

impl Warning {
    pub(crate) fn unsupported_setting(setting: &str, details: Option<&str>) -> Self {
        Self::UnsupportedSetting {
            setting: setting.to_owned(),
            details: details.map(str::to_owned),
        }
    }
}

/// Request body split into prompt and settings, for debugging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCall {
    /// The `messages` or `prompt` field
    pub raw_prompt: Value,
    /// Every other body field
    pub raw_settings: Map<String, Value>,
}

impl RawCall {
    /// Split a serialized request body
    pub fn from_body(body: &Value) -> Self {
        let mut raw_settings = body.as_object().cloned().unwrap_or_default();
        let raw_prompt = raw_settings
            .remove("messages")
            .or_else(|| raw_settings.remove("prompt"))
            .unwrap_or(Value::Null);
        Self {
            raw_prompt,
            raw_settings,
        }
    }
}

/// Vendor response as received
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body, absent for streams
    pub body: Option<Value>,
}

/// Result of a non-streaming call
#[derive(Debug, Clone)]
pub struct GenerateResult {
    /// Generated text
    pub text: Option<String>,
    /// Reasoning text, when the vendor exposes it
    pub reasoning: Option<String>,
    /// Tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// Why generation stopped
    pub finish_reason: FinishReason,
    /// Token usage
    pub usage: Usage,
    /// Ignored settings and tools
    pub warnings: Vec<Warning>,
    /// Response identity
    pub response: ResponseMetadata,
    /// Fields gathered by the metadata extractor
    pub provider_metadata: Option<ProviderMetadata>,
    /// Request body, split
    pub raw_call: RawCall,
    /// Response headers and body
    pub raw_response: RawResponse,
    /// Serialized request body
    pub request_body: String,
}

/// Result of a streaming call
pub struct StreamResult {
    /// Normalized part stream
    pub stream: PartStream,
    /// Request body, split
    pub raw_call: RawCall,
    /// Response headers
    pub raw_response: RawResponse,
    /// Ignored settings and tools
    pub warnings: Vec<Warning>,
    /// Serialized request body
    pub request_body: String,
}

impl std::fmt::Debug for StreamResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResult")
            .field("raw_call", &self.raw_call)
            .field("raw_response", &self.raw_response)
            .field("warnings", &self.warnings)
            .field("request_body", &self.request_body)
            .finish_non_exhaustive()
    }
}
