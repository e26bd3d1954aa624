//! Legacy text completions façade

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::LanguageModel;
use super::config::ModelConfig;
use super::transport::{event_data, post_json, read_json, serialize_body, with_abort};
use crate::convert::{decode_completion_response, provider_fields, to_completion_prompt};
use crate::error::LlmError;
use crate::protocol::completion::{CompatCompletionRequest, CompatCompletionResponse};
use crate::protocol::{CompatStreamOptions, Extended};
use crate::stream::{CompletionStreamProcessor, reconstruct};
use crate::types::{
    CallOptions, GenerateResult, Mode, ObjectGenerationMode, RawResponse, ResponseFormat, StreamResult, Warning,
};

const COMPLETION_PATH: &str = "/completions";

/// Per-model completion settings
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    /// Echo the prompt back in the completion
    pub echo: Option<bool>,
    /// Token id to bias adjustments
    pub logit_bias: Option<BTreeMap<String, f64>>,
    /// Text appended after the completion
    pub suffix: Option<String>,
    /// End-user identifier
    pub user: Option<String>,
    /// Label for user turns in rendered transcripts
    pub user_label: String,
    /// Label for assistant turns in rendered transcripts
    pub assistant_label: String,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            echo: None,
            logit_bias: None,
            suffix: None,
            user: None,
            user_label: "user".to_owned(),
            assistant_label: "assistant".to_owned(),
        }
    }
}

/// Language model backed by `/completions`
///
/// Tools and object generation are not available on this endpoint.
#[derive(Debug, Clone)]
pub struct CompletionLanguageModel {
    model_id: String,
    settings: CompletionSettings,
    config: ModelConfig,
}

impl CompletionLanguageModel {
    /// Create a completion model
    pub fn new(model_id: impl Into<String>, settings: CompletionSettings, config: ModelConfig) -> Self {
        Self {
            model_id: model_id.into(),
            settings,
            config,
        }
    }

    /// Build the request body and collect warnings
    pub fn args(&self, options: &CallOptions) -> Result<(Extended<CompatCompletionRequest>, Vec<Warning>), LlmError> {
        let mut warnings = Vec::new();

        if options.top_k.is_some() {
            warnings.push(Warning::unsupported_setting("topK", None));
        }
        if let Some(ResponseFormat::Json { .. }) = &options.response_format {
            warnings.push(Warning::unsupported_setting(
                "responseFormat",
                Some("JSON response format is not supported."),
            ));
        }

        match &options.mode {
            Mode::Regular { tools, tool_choice } => {
                if !tools.is_empty() {
                    return Err(LlmError::unsupported("tools"));
                }
                if tool_choice.is_some() {
                    return Err(LlmError::unsupported("toolChoice"));
                }
            }
            Mode::ObjectJson { .. } => return Err(LlmError::unsupported("object-json mode")),
            Mode::ObjectTool { .. } => return Err(LlmError::unsupported("object-tool mode")),
        }

        let rendered = to_completion_prompt(
            &options.prompt,
            options.input_format,
            &self.settings.user_label,
            &self.settings.assistant_label,
        )?;

        let stop: Vec<String> = rendered
            .stop_sequences
            .unwrap_or_default()
            .into_iter()
            .chain(options.stop_sequences.iter().flatten().cloned())
            .collect();

        let request = CompatCompletionRequest {
            model: self.model_id.clone(),
            echo: self.settings.echo,
            logit_bias: self.settings.logit_bias.clone(),
            suffix: self.settings.suffix.clone(),
            user: self.settings.user.clone(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
            seed: options.seed,
            prompt: rendered.prompt,
            stop: (!stop.is_empty()).then_some(stop),
            stream: None,
            stream_options: None,
        };

        let extensions = provider_fields(options.provider_metadata.as_ref(), self.config.provider_options_name());
        Ok((Extended::with_extensions(request, extensions), warnings))
    }
}

#[async_trait]
impl LanguageModel for CompletionLanguageModel {
    fn provider(&self) -> &str {
        &self.config.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn default_object_generation_mode(&self) -> Option<ObjectGenerationMode> {
        None
    }

    fn supports_structured_outputs(&self) -> bool {
        false
    }

    async fn do_generate(&self, options: CallOptions) -> Result<GenerateResult, LlmError> {
        let (body, warnings) = self.args(&options)?;
        let (request_body, raw_call) = serialize_body(&body)?;
        let url = (self.config.url)(&self.model_id, COMPLETION_PATH);

        tracing::debug!(provider = %self.config.provider, model = %self.model_id, "sending completion request");

        let (headers, raw, response) = with_abort(options.abort.as_ref(), async {
            let response = post_json(&self.config, &url, &options.headers, request_body.clone()).await?;
            read_json::<CompatCompletionResponse>(response).await
        })
        .await?;

        let provider_metadata = self
            .config
            .metadata_extractor
            .as_ref()
            .and_then(|extractor| extractor.extract_metadata(&raw));
        let decoded = decode_completion_response(response)?;

        Ok(GenerateResult {
            text: decoded.text,
            reasoning: None,
            tool_calls: Vec::new(),
            finish_reason: decoded.finish_reason,
            usage: decoded.usage,
            warnings,
            response: decoded.response,
            provider_metadata,
            raw_call,
            raw_response: RawResponse {
                headers,
                body: Some(raw),
            },
            request_body,
        })
    }

    async fn do_stream(&self, options: CallOptions) -> Result<StreamResult, LlmError> {
        let (mut body, warnings) = self.args(&options)?;
        body.body.stream = Some(true);
        body.body.stream_options = self
            .config
            .include_usage
            .then_some(CompatStreamOptions { include_usage: true });
        let (request_body, raw_call) = serialize_body(&body)?;
        let url = (self.config.url)(&self.model_id, COMPLETION_PATH);

        tracing::debug!(provider = %self.config.provider, model = %self.model_id, "sending streaming completion request");

        let response = with_abort(
            options.abort.as_ref(),
            post_json(&self.config, &url, &options.headers, request_body.clone()),
        )
        .await?;
        let headers = response.headers().clone();

        let processor = CompletionStreamProcessor::new(
            self.config
                .metadata_extractor
                .as_ref()
                .map(|extractor| extractor.create_stream_extractor()),
        );

        Ok(StreamResult {
            stream: reconstruct(event_data(response), processor, options.abort),
            raw_call,
            raw_response: RawResponse { headers, body: None },
            warnings,
            request_body,
        })
    }
}
