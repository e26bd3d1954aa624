//! Legacy text completions wire format (`/completions`)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CompatStreamOptions, CompatUsage};

// -- Request types --

/// Text completion request body
#[derive(Debug, Clone, Serialize)]
pub struct CompatCompletionRequest {
    /// Model identifier
    pub model: String,
    /// Echo the prompt back in the completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echo: Option<bool>,
    /// Token id to bias adjustments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<BTreeMap<String, f64>>,
    /// Text appended after the completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
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
    /// Random seed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Rendered prompt text
    pub prompt: String,
    /// Stop sequences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Stream options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<CompatStreamOptions>,
}

// -- Response types --

/// Non-streaming completion response
#[derive(Debug, Clone, Deserialize)]
pub struct CompatCompletionResponse {
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
    pub choices: Vec<CompatCompletionChoice>,
    /// Token usage
    #[serde(default)]
    pub usage: Option<CompatUsage>,
}

/// Choice in a completion response or chunk
#[derive(Debug, Clone, Deserialize)]
pub struct CompatCompletionChoice {
    /// Generated text
    #[serde(default)]
    pub text: Option<String>,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Streaming completion chunk
#[derive(Debug, Clone, Deserialize)]
pub struct CompatCompletionChunk {
    /// Response id
    #[serde(default)]
    pub id: Option<String>,
    /// Unix creation time in seconds
    #[serde(default)]
    pub created: Option<i64>,
    /// Model that answered
    #[serde(default)]
    pub model: Option<String>,
    /// Choice fragments
    pub choices: Vec<CompatCompletionChoice>,
    /// Token usage, usually only on the last chunk
    #[serde(default)]
    pub usage: Option<CompatUsage>,
}
