use std::fmt;
use std::sync::Arc;

use http::HeaderMap;
use reqwest::Client;

use super::transport::ErrorStructure;
use crate::metadata::MetadataExtractor;
use crate::types::ObjectGenerationMode;

/// Builds the request URL from the model id and the API path
pub type UrlBuilder = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Builds the headers sent with every request
pub type HeaderBuilder = Arc<dyn Fn() -> HeaderMap + Send + Sync>;

/// Immutable configuration shared by the model façades
#[derive(Clone)]
pub struct ModelConfig {
    /// Provider id, e.g. `example.chat`
    pub provider: String,
    /// URL builder
    pub url: UrlBuilder,
    /// Header builder
    pub headers: HeaderBuilder,
    /// HTTP client
    pub client: Client,
    /// Request a usage chunk when streaming
    pub include_usage: bool,
    /// Vendor honours JSON schemas in `response_format`
    pub supports_structured_outputs: bool,
    /// Preferred object generation strategy
    pub default_object_generation_mode: Option<ObjectGenerationMode>,
    /// Lifts vendor-specific fields into provider metadata
    pub metadata_extractor: Option<Arc<dyn MetadataExtractor>>,
    /// Decodes non-2xx response bodies
    pub error_structure: Arc<dyn ErrorStructure>,
}

impl ModelConfig {
    /// Key under which provider metadata is looked up
    ///
    /// The part of the provider id before the first `.`.
    pub fn provider_options_name(&self) -> &str {
        self.provider
            .split_once('.')
            .map_or(self.provider.as_str(), |(name, _)| name)
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("include_usage", &self.include_usage)
            .field("supports_structured_outputs", &self.supports_structured_outputs)
            .field("default_object_generation_mode", &self.default_object_generation_mode)
            .field("metadata_extractor", &self.metadata_extractor.is_some())
            .finish_non_exhaustive()
    }
}
