//! Language-model adapter for OpenAI-compatible chat and completion APIs
//!
//! Converts provider-agnostic prompts into the vendor wire format, sends them
//! over HTTP, and turns both complete responses and server-sent event streams
//! back into normalized results. The stream reconstructor reassembles tool
//! calls from argument fragments while preserving chunk order.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod convert;
pub mod error;
pub mod metadata;
pub mod protocol;
pub mod provider;
pub mod stream;
pub mod types;

pub use error::LlmError;
pub use metadata::{MetadataExtractor, ResponseFieldExtractor, StreamMetadataExtractor};
pub use provider::{
    ChatLanguageModel, ChatSettings, CompatProvider, CompletionLanguageModel, CompletionSettings, DefaultErrorStructure,
    ErrorStructure, LanguageModel, ProviderSettings,
};
pub use types::{CallOptions, GenerateResult, Message, StreamPart, StreamResult};
