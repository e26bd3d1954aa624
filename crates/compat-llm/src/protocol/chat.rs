//! Chat completions wire format (`/chat/completions`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CompatStreamOptions, CompatUsage, Extended};
use crate::types::FunctionTool;

// -- Request types --

/// Chat completion request body
#[derive(Debug, Clone, Serialize)]
pub struct CompatChatRequest {
    /// Model identifier
    pub model: String,
    /// End-user identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Frequency penalty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Presence penalty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Output format constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<CompatResponseFormat>,
    /// Stop sequences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Random seed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Conversation messages
    pub messages: Vec<CompatMessage>,
    /// Tool definitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<CompatTool>>,
    /// Tool choice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<CompatToolChoice>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Stream options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<CompatStreamOptions>,
}

/// Message with provider fields merged in
pub type CompatMessage = Extended<CompatMessageBody>;

/// Typed part of a request message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum CompatMessageBody {
    /// System instruction
    System {
        /// Instruction text
        content: String,
    },
    /// User turn
    User {
        /// Text or content parts
        content: CompatUserContent,
    },
    /// Assistant turn
    Assistant {
        /// Concatenated text
        content: String,
        /// Requested tool calls
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<Extended<CompatToolCall>>>,
    },
    /// Tool result
    Tool {
        /// Call this result answers
        tool_call_id: String,
        /// JSON-encoded result
        content: String,
    },
}

/// User content is either a plain string or a list of parts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CompatUserContent {
    /// Plain text
    Text(String),
    /// Multi-part content
    Parts(Vec<Extended<CompatContentPart>>),
}

/// User content part
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompatContentPart {
    /// Text part
    Text {
        /// The text
        text: String,
    },
    /// Image part
    ImageUrl {
        /// Image location
        image_url: CompatImageUrl,
    },
}

/// Image location, a remote or `data:` URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatImageUrl {
    /// The URL
    pub url: String,
}

/// Tool call inside an assistant message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatToolCall {
    /// Call identifier
    pub id: String,
    /// Always `function`
    #[serde(rename = "type")]
    pub call_type: &'static str,
    /// Called function
    pub function: CompatFunctionCall,
}

/// Function name and JSON-encoded arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatFunctionCall {
    /// Function name
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

/// Tool definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatTool {
    /// Always `function`
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    /// Function definition
    pub function: CompatFunctionDefinition,
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatFunctionDefinition {
    /// Function name
    pub name: String,
    /// What the function does
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the arguments
    pub parameters: Value,
}

impl From<&FunctionTool> for CompatTool {
    fn from(tool: &FunctionTool) -> Self {
        Self {
            tool_type: "function",
            function: CompatFunctionDefinition {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }
}

/// Tool choice, a literal mode or a named function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CompatToolChoice {
    /// `auto`, `none` or `required`
    Mode(CompatToolChoiceMode),
    /// Specific function
    Function {
        /// Always `function`
        #[serde(rename = "type")]
        choice_type: &'static str,
        /// Function to call
        function: CompatToolChoiceFunction,
    },
}

impl CompatToolChoice {
    /// Force a call to the named function
    pub fn function(name: impl Into<String>) -> Self {
        Self::Function {
            choice_type: "function",
            function: CompatToolChoiceFunction { name: name.into() },
        }
    }
}

/// Literal tool choice mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatToolChoiceMode {
    /// Model decides
    Auto,
    /// No tool calls
    None,
    /// At least one tool call
    Required,
}

/// Named function for a forced tool choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatToolChoiceFunction {
    /// Function name
    pub name: String,
}

/// Output format constraint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompatResponseFormat {
    /// Any JSON object
    JsonObject,
    /// JSON matching a schema
    JsonSchema {
        /// Schema definition
        json_schema: CompatJsonSchema,
    },
}

/// Named JSON schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatJsonSchema {
    /// The schema
    pub schema: Value,
    /// Schema name
    pub name: String,
    /// Schema description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// -- Response types --

/// Non-streaming chat response
#[derive(Debug, Clone, Deserialize)]
pub struct CompatChatResponse {
    /// Response id
    #[serde(default)]
    pub id: Option<String>,
    /// Unix creation time in seconds
    #[serde(default)]
    pub created: Option<i64>,
    /// Model that answered
    #[serde(default)]
    pub model: Option<String>,
    /// Generated choices
    pub choices: Vec<CompatChatChoice>,
    /// Token usage
    #[serde(default)]
    pub usage: Option<CompatUsage>,
}

/// Choice in a chat response
#[derive(Debug, Clone, Deserialize)]
pub struct CompatChatChoice {
    /// Generated message
    pub message: CompatResponseMessage,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Generated assistant message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompatResponseMessage {
    /// Message role
    #[serde(default)]
    pub role: Option<String>,
    /// Text content
    #[serde(default)]
    pub content: Option<String>,
    /// Reasoning text
    #[serde(default)]
    pub reasoning_content: Option<String>,
    /// Tool calls
    #[serde(default)]
    pub tool_calls: Option<Vec<CompatResponseToolCall>>,
}

/// Tool call in a response message
#[derive(Debug, Clone, Deserialize)]
pub struct CompatResponseToolCall {
    /// Call identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Call type
    #[serde(default, rename = "type")]
    pub call_type: Option<String>,
    /// Called function
    pub function: CompatFunctionCall,
}

// -- Streaming types --

/// Streaming chat chunk
#[derive(Debug, Clone, Deserialize)]
pub struct CompatChatChunk {
    /// Response id
    #[serde(default)]
    pub id: Option<String>,
    /// Unix creation time in seconds
    #[serde(default)]
    pub created: Option<i64>,
    /// Model that answered
    #[serde(default)]
    pub model: Option<String>,
    /// Choice deltas
    pub choices: Vec<CompatChunkChoice>,
    /// Token usage, usually only on the last chunk
    #[serde(default)]
    pub usage: Option<CompatUsage>,
}

/// Choice delta in a chunk
#[derive(Debug, Clone, Deserialize)]
pub struct CompatChunkChoice {
    /// Incremental content
    #[serde(default)]
    pub delta: Option<CompatChunkDelta>,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental assistant content
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompatChunkDelta {
    /// Message role
    #[serde(default)]
    pub role: Option<String>,
    /// Text fragment
    #[serde(default)]
    pub content: Option<String>,
    /// Reasoning fragment
    #[serde(default)]
    pub reasoning_content: Option<String>,
    /// Tool-call fragments
    #[serde(default)]
    pub tool_calls: Option<Vec<CompatToolCallDelta>>,
}

/// Fragment of a tool call
#[derive(Debug, Clone, Deserialize)]
pub struct CompatToolCallDelta {
    /// Slot this fragment belongs to
    #[serde(default)]
    pub index: Option<u32>,
    /// Call identifier, usually only on the first fragment
    #[serde(default)]
    pub id: Option<String>,
    /// Call type, usually only on the first fragment
    #[serde(default, rename = "type")]
    pub call_type: Option<String>,
    /// Function name and argument fragment
    #[serde(default)]
    pub function: Option<CompatFunctionDelta>,
}

/// Function fragment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompatFunctionDelta {
    /// Function name
    #[serde(default)]
    pub name: Option<String>,
    /// Argument text fragment
    #[serde(default)]
    pub arguments: Option<String>,
}
