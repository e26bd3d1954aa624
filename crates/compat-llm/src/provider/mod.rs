//! Language model façades and the provider factory that builds them

pub mod chat;
pub mod completion;
pub mod config;
pub mod factory;
pub mod transport;

use async_trait::async_trait;

pub use chat::{ChatLanguageModel, ChatSettings};
pub use completion::{CompletionLanguageModel, CompletionSettings};
pub use config::{HeaderBuilder, ModelConfig, UrlBuilder};
pub use factory::{CompatProvider, ProviderSettings};
pub use transport::{DefaultErrorStructure, ErrorStructure};

use crate::error::LlmError;
use crate::types::{CallOptions, GenerateResult, ObjectGenerationMode, StreamResult};

/// Uniform contract for generating text from a model
///
/// Argument errors are returned before any request is sent. Warnings for
/// ignored settings are attached to successful results.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider id, e.g. `example.chat`
    fn provider(&self) -> &str;

    /// Vendor model id
    fn model_id(&self) -> &str;

    /// Preferred object generation strategy, if any
    fn default_object_generation_mode(&self) -> Option<ObjectGenerationMode>;

    /// Whether JSON schemas are honoured in `response_format`
    fn supports_structured_outputs(&self) -> bool;

    /// Generate a complete response
    async fn do_generate(&self, options: CallOptions) -> Result<GenerateResult, LlmError>;

    /// Generate a response as a stream of parts
    async fn do_stream(&self, options: CallOptions) -> Result<StreamResult, LlmError>;
}
