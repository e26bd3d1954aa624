//! Configuration for the OpenAI-compatible adapter
//!
//! Loaded from TOML with `{{ env.VAR }}` placeholders expanded before parsing.

#![allow(clippy::must_use_candidate)]

mod env;
mod loader;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

pub use env::expand_env;

/// Top-level configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
    /// Vendor configurations keyed by provider name
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,
}

/// Logging configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// One OpenAI-compatible vendor
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API base URL, e.g. `https://api.example.com/v1`
    pub base_url: Url,
    /// Sent as a bearer token
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Request a usage chunk when streaming
    #[serde(default)]
    pub include_usage: bool,
    /// Vendor honours JSON schemas in `response_format`
    #[serde(default)]
    pub supports_structured_outputs: bool,
    /// Preferred object generation strategy
    #[serde(default)]
    pub default_object_generation_mode: Option<ObjectGenerationMode>,
    /// Extra headers for every request
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Query parameters appended to every URL
    #[serde(default)]
    pub query_params: IndexMap<String, String>,
    /// Top-level response fields copied into provider metadata
    #[serde(default)]
    pub metadata_fields: Vec<String>,
    /// Chat model settings
    #[serde(default)]
    pub chat: ChatModelConfig,
    /// Completion model settings
    #[serde(default)]
    pub completion: CompletionModelConfig,
}

/// Object generation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectGenerationMode {
    /// `response_format` with a JSON schema
    Json,
    /// A single forced tool call
    Tool,
}

/// Chat model settings
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatModelConfig {
    /// End-user identifier
    #[serde(default)]
    pub user: Option<String>,
    /// Serve streams from a single non-streaming request
    #[serde(default)]
    pub simulate_streaming: bool,
}

/// Completion model settings
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionModelConfig {
    /// Echo the prompt back in the completion
    #[serde(default)]
    pub echo: Option<bool>,
    /// Token id to bias adjustments
    #[serde(default)]
    pub logit_bias: Option<BTreeMap<String, f64>>,
    /// Text appended after the completion
    #[serde(default)]
    pub suffix: Option<String>,
    /// End-user identifier
    #[serde(default)]
    pub user: Option<String>,
    /// Label for user turns, defaults to `user`
    #[serde(default)]
    pub user_label: Option<String>,
    /// Label for assistant turns, defaults to `assistant`
    #[serde(default)]
    pub assistant_label: Option<String>,
}
