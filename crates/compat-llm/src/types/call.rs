use http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::prompt::{Prompt, ProviderMetadata};

/// Options for a single generate or stream call
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// How the caller phrased the prompt
    pub input_format: InputFormat,
    /// Generation mode
    pub mode: Mode,
    /// Conversation to send
    pub prompt: Prompt,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Sequences that stop generation
    pub stop_sequences: Option<Vec<String>>,
    /// Nucleus sampling parameter
    pub top_p: Option<f64>,
    /// Top-k sampling, not supported by this vendor family
    pub top_k: Option<u32>,
    /// Presence penalty
    pub presence_penalty: Option<f64>,
    /// Frequency penalty
    pub frequency_penalty: Option<f64>,
    /// Desired output format
    pub response_format: Option<ResponseFormat>,
    /// Seed for deterministic sampling
    pub seed: Option<i64>,
    /// Extra headers for this call, overriding configured ones
    pub headers: HeaderMap,
    /// Request-level provider options merged into the body
    pub provider_metadata: Option<ProviderMetadata>,
    /// Cancels the request and truncates the stream when fired
    pub abort: Option<CancellationToken>,
}

impl CallOptions {
    /// Options for a plain prompt with default settings
    pub fn new(prompt: Prompt) -> Self {
        Self {
            prompt,
            ..Self::default()
        }
    }
}

/// Whether the caller supplied a bare prompt or a message list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputFormat {
    /// Single prompt string wrapped in a user message
    Prompt,
    /// Full message list
    #[default]
    Messages,
}

/// Generation mode for a call
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Free-form generation with optional tools
    Regular {
        /// Tools the model may call
        tools: Vec<Tool>,
        /// How the model should pick a tool
        tool_choice: Option<ToolChoice>,
    },
    /// JSON object generation through the response format
    ObjectJson {
        /// JSON schema the object must satisfy
        schema: Option<Value>,
        /// Schema name
        name: Option<String>,
        /// Schema description
        description: Option<String>,
    },
    /// JSON object generation through a forced tool call
    ObjectTool {
        /// The tool whose arguments form the object
        tool: FunctionTool,
    },
}

impl Default for Mode {
    fn default() -> Self {
        Self::Regular {
            tools: Vec::new(),
            tool_choice: None,
        }
    }
}

/// Tool definition offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Tool {
    /// Plain function tool
    Function(FunctionTool),
    /// Framework-built-in tool, not representable by this vendor
    ProviderDefined {
        /// Fully qualified tool id
        id: String,
        /// Tool name
        name: String,
        /// Tool arguments
        #[serde(default)]
        args: Value,
    },
}

/// Function the model may call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    /// Function name
    pub name: String,
    /// What the function does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the arguments
    pub parameters: Value,
}

/// How the model should pick a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolChoice {
    /// Model decides
    Auto,
    /// No tool calls
    None,
    /// At least one tool call
    Required,
    /// A specific tool
    Tool {
        /// Name of the required tool
        tool_name: String,
    },
}

/// Requested output format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Free-form text
    Text,
    /// JSON, optionally constrained by a schema
    Json {
        /// JSON schema
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<Value>,
        /// Schema name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Schema description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

/// Default strategy for object generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectGenerationMode {
    /// Use the JSON response format
    Json,
    /// Use a forced tool call
    Tool,
}
