//! Provider factory wiring base URL, auth and defaults into model façades

use std::sync::Arc;

use anyhow::anyhow;
use compat_config::{ChatModelConfig, CompletionModelConfig, ProviderConfig};
use http::header::{AUTHORIZATION, HeaderName};
use http::{HeaderMap, HeaderValue};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::chat::{ChatLanguageModel, ChatSettings};
use super::completion::{CompletionLanguageModel, CompletionSettings};
use super::config::{HeaderBuilder, ModelConfig, UrlBuilder};
use super::transport::{DefaultErrorStructure, ErrorStructure};
use crate::error::LlmError;
use crate::metadata::{MetadataExtractor, ResponseFieldExtractor};
use crate::types::ObjectGenerationMode;

/// Settings for an OpenAI-compatible provider
#[derive(Clone)]
pub struct ProviderSettings {
    /// Provider name, also the provider metadata key
    pub name: String,
    /// API base URL, e.g. `https://api.example.com/v1`
    pub base_url: String,
    /// Sent as a bearer token
    pub api_key: Option<SecretString>,
    /// Extra headers for every request, overriding the auth header
    pub headers: HeaderMap,
    /// Query parameters appended to every URL
    pub query_params: Vec<(String, String)>,
    /// Request a usage chunk when streaming
    pub include_usage: bool,
    /// Vendor honours JSON schemas in `response_format`
    pub supports_structured_outputs: bool,
    /// Preferred object generation strategy
    pub default_object_generation_mode: Option<ObjectGenerationMode>,
    /// Lifts vendor-specific fields into provider metadata
    pub metadata_extractor: Option<Arc<dyn MetadataExtractor>>,
    /// Decodes non-2xx bodies, defaults to [`DefaultErrorStructure`]
    pub error_structure: Option<Arc<dyn ErrorStructure>>,
    /// HTTP client to reuse
    pub client: Option<Client>,
}

impl ProviderSettings {
    /// Settings with only a name and base URL
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: None,
            headers: HeaderMap::new(),
            query_params: Vec::new(),
            include_usage: false,
            supports_structured_outputs: false,
            default_object_generation_mode: None,
            metadata_extractor: None,
            error_structure: None,
            client: None,
        }
    }
}

/// Builds chat and completion models for one OpenAI-compatible vendor
#[derive(Debug, Clone)]
pub struct CompatProvider {
    name: String,
    config: ModelConfig,
}

impl CompatProvider {
    /// Create a provider
    ///
    /// Fails when the API key cannot be sent as a header value.
    pub fn new(settings: ProviderSettings) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &settings.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
                .map_err(|e| anyhow!("API key is not a valid header value: {e}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        headers.extend(settings.headers);

        let base_url = settings.base_url.trim_end_matches('/').to_owned();
        let query = if settings.query_params.is_empty() {
            String::new()
        } else {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&settings.query_params)
                .finish();
            format!("?{encoded}")
        };

        let url: UrlBuilder = Arc::new(move |_model_id: &str, path: &str| format!("{base_url}{path}{query}"));
        let headers: HeaderBuilder = Arc::new(move || headers.clone());

        let config = ModelConfig {
            provider: settings.name.clone(),
            url,
            headers,
            client: settings.client.unwrap_or_default(),
            include_usage: settings.include_usage,
            supports_structured_outputs: settings.supports_structured_outputs,
            default_object_generation_mode: settings.default_object_generation_mode,
            metadata_extractor: settings.metadata_extractor,
            error_structure: settings
                .error_structure
                .unwrap_or_else(|| Arc::new(DefaultErrorStructure)),
        };

        tracing::debug!(provider = %settings.name, "provider configured");

        Ok(Self {
            name: settings.name,
            config,
        })
    }

    /// Create a provider from its configuration entry
    pub fn from_config(name: &str, config: &ProviderConfig) -> Result<Self, LlmError> {
        let mut settings = ProviderSettings::new(name, config.base_url.as_str());
        settings.api_key.clone_from(&config.api_key);
        settings.include_usage = config.include_usage;
        settings.supports_structured_outputs = config.supports_structured_outputs;
        settings.default_object_generation_mode = config.default_object_generation_mode.map(Into::into);
        settings.query_params = config
            .query_params
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        for (key, value) in &config.headers {
            let header_name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| anyhow!("invalid header name `{key}` for provider `{name}`: {e}"))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| anyhow!("invalid value for header `{key}` for provider `{name}`: {e}"))?;
            settings.headers.insert(header_name, header_value);
        }

        if !config.metadata_fields.is_empty() {
            settings.metadata_extractor = Some(Arc::new(ResponseFieldExtractor::new(
                name,
                config.metadata_fields.iter().cloned(),
            )));
        }

        Self::new(settings)
    }

    /// Provider name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chat model with the given settings
    pub fn chat_model(&self, model_id: impl Into<String>, settings: ChatSettings) -> ChatLanguageModel {
        ChatLanguageModel::new(model_id, settings, self.model_config("chat"))
    }

    /// Completion model with the given settings
    pub fn completion_model(
        &self,
        model_id: impl Into<String>,
        settings: CompletionSettings,
    ) -> CompletionLanguageModel {
        CompletionLanguageModel::new(model_id, settings, self.model_config("completion"))
    }

    fn model_config(&self, kind: &str) -> ModelConfig {
        ModelConfig {
            provider: format!("{}.{kind}", self.name),
            ..self.config.clone()
        }
    }
}

impl From<compat_config::ObjectGenerationMode> for ObjectGenerationMode {
    fn from(mode: compat_config::ObjectGenerationMode) -> Self {
        match mode {
            compat_config::ObjectGenerationMode::Json => Self::Json,
            compat_config::ObjectGenerationMode::Tool => Self::Tool,
        }
    }
}

impl From<&ChatModelConfig> for ChatSettings {
    fn from(config: &ChatModelConfig) -> Self {
        Self {
            user: config.user.clone(),
            simulate_streaming: config.simulate_streaming,
        }
    }
}

impl From<&CompletionModelConfig> for CompletionSettings {
    fn from(config: &CompletionModelConfig) -> Self {
        let defaults = Self::default();
        Self {
            echo: config.echo,
            logit_bias: config.logit_bias.clone(),
            suffix: config.suffix.clone(),
            user: config.user.clone(),
            user_label: config.user_label.clone().unwrap_or(defaults.user_label),
            assistant_label: config.assistant_label.clone().unwrap_or(defaults.assistant_label),
        }
    }
}
