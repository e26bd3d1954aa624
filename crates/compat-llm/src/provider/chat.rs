//! Chat completions façade

use async_trait::async_trait;

use super::LanguageModel;
use super::config::ModelConfig;
use super::transport::{event_data, post_json, read_json, serialize_body, with_abort};
use crate::convert::{decode_chat_response, prepare_tools, provider_fields, to_chat_messages};
use crate::error::LlmError;
use crate::protocol::chat::{
    CompatChatRequest, CompatChatResponse, CompatJsonSchema, CompatResponseFormat, CompatTool, CompatToolChoice,
};
use crate::protocol::{CompatStreamOptions, Extended};
use crate::stream::{ChatStreamProcessor, reconstruct, simulate_stream};
use crate::types::{
    CallOptions, GenerateResult, Mode, ObjectGenerationMode, RawResponse, ResponseFormat, StreamResult, Warning,
};

const CHAT_PATH: &str = "/chat/completions";
const DEFAULT_SCHEMA_NAME: &str = "response";

/// Per-model chat settings
#[derive(Debug, Clone, Default)]
pub struct ChatSettings {
    /// End-user identifier sent with every request
    pub user: Option<String>,
    /// Serve `do_stream` from a single non-streaming call
    pub simulate_streaming: bool,
}

/// Language model backed by `/chat/completions`
#[derive(Debug, Clone)]
pub struct ChatLanguageModel {
    model_id: String,
    settings: ChatSettings,
    config: ModelConfig,
}

impl ChatLanguageModel {
    /// Create a chat model
    pub fn new(model_id: impl Into<String>, settings: ChatSettings, config: ModelConfig) -> Self {
        Self {
            model_id: model_id.into(),
            settings,
            config,
        }
    }

    /// Build the request body and collect warnings
    pub fn args(&self, options: &CallOptions) -> Result<(Extended<CompatChatRequest>, Vec<Warning>), LlmError> {
        let mut warnings = Vec::new();

        if options.top_k.is_some() {
            warnings.push(Warning::unsupported_setting("topK", None));
        }
        if let Some(ResponseFormat::Json { schema: Some(_), .. }) = &options.response_format
            && !self.config.supports_structured_outputs
        {
            warnings.push(Warning::unsupported_setting(
                "responseFormat",
                Some("JSON response format schema is only supported with structuredOutputs"),
            ));
        }

        let provider = self.config.provider_options_name();
        let response_format = match &options.response_format {
            Some(ResponseFormat::Json {
                schema,
                name,
                description,
            }) => Some(self.json_response_format(schema.as_ref(), name.as_deref(), description.as_deref())),
            Some(ResponseFormat::Text) | None => None,
        };

        let mut request = CompatChatRequest {
            model: self.model_id.clone(),
            user: self.settings.user.clone(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
            response_format,
            stop: options.stop_sequences.clone(),
            seed: options.seed,
            messages: to_chat_messages(&options.prompt, provider)?,
            tools: None,
            tool_choice: None,
            stream: None,
            stream_options: None,
        };

        match &options.mode {
            Mode::Regular { tools, tool_choice } => {
                let prepared = prepare_tools(tools, tool_choice.as_ref());
                request.tools = prepared.tools;
                request.tool_choice = prepared.tool_choice;
                warnings.extend(prepared.warnings);
            }
            Mode::ObjectJson {
                schema,
                name,
                description,
            } => {
                request.response_format =
                    Some(self.json_response_format(schema.as_ref(), name.as_deref(), description.as_deref()));
            }
            Mode::ObjectTool { tool } => {
                request.tools = Some(vec![CompatTool::from(tool)]);
                request.tool_choice = Some(CompatToolChoice::function(tool.name.clone()));
            }
        }

        let extensions = provider_fields(options.provider_metadata.as_ref(), provider);
        Ok((Extended::with_extensions(request, extensions), warnings))
    }

    fn json_response_format(
        &self,
        schema: Option<&serde_json::Value>,
        name: Option<&str>,
        description: Option<&str>,
    ) -> CompatResponseFormat {
        match schema {
            Some(schema) if self.config.supports_structured_outputs => CompatResponseFormat::JsonSchema {
                json_schema: CompatJsonSchema {
                    schema: schema.clone(),
                    name: name.unwrap_or(DEFAULT_SCHEMA_NAME).to_owned(),
                    description: description.map(str::to_owned),
                },
            },
            _ => CompatResponseFormat::JsonObject,
        }
    }
}

#[async_trait]
impl LanguageModel for ChatLanguageModel {
    fn provider(&self) -> &str {
        &self.config.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn default_object_generation_mode(&self) -> Option<ObjectGenerationMode> {
        self.config.default_object_generation_mode
    }

    fn supports_structured_outputs(&self) -> bool {
        self.config.supports_structured_outputs
    }

    async fn do_generate(&self, options: CallOptions) -> Result<GenerateResult, LlmError> {
        let (body, warnings) = self.args(&options)?;
        let (request_body, raw_call) = serialize_body(&body)?;
        let url = (self.config.url)(&self.model_id, CHAT_PATH);

        tracing::debug!(provider = %self.config.provider, model = %self.model_id, "sending chat request");

        let (headers, raw, response) = with_abort(options.abort.as_ref(), async {
            let response = post_json(&self.config, &url, &options.headers, request_body.clone()).await?;
            read_json::<CompatChatResponse>(response).await
        })
        .await?;

        let provider_metadata = self
            .config
            .metadata_extractor
            .as_ref()
            .and_then(|extractor| extractor.extract_metadata(&raw));
        let decoded = decode_chat_response(response)?;

        Ok(GenerateResult {
            text: decoded.text,
            reasoning: decoded.reasoning,
            tool_calls: decoded.tool_calls,
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
        if self.settings.simulate_streaming {
            let result = self.do_generate(options).await?;
            return Ok(StreamResult {
                stream: simulate_stream(&result),
                raw_call: result.raw_call,
                raw_response: result.raw_response,
                warnings: result.warnings,
                request_body: result.request_body,
            });
        }

        let (mut body, warnings) = self.args(&options)?;
        body.body.stream = Some(true);
        body.body.stream_options = self
            .config
            .include_usage
            .then_some(CompatStreamOptions { include_usage: true });
        let (request_body, raw_call) = serialize_body(&body)?;
        let url = (self.config.url)(&self.model_id, CHAT_PATH);

        tracing::debug!(provider = %self.config.provider, model = %self.model_id, "sending streaming chat request");

        let response = with_abort(
            options.abort.as_ref(),
            post_json(&self.config, &url, &options.headers, request_body.clone()),
        )
        .await?;
        let headers = response.headers().clone();

        let processor = ChatStreamProcessor::new(
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
