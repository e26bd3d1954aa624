//! Hooks for lifting vendor-specific response fields into provider metadata

use serde_json::{Map, Value};

use crate::types::ProviderMetadata;

/// Extracts provider metadata from raw vendor responses
pub trait MetadataExtractor: Send + Sync {
    /// Metadata from a complete non-streaming response body
    fn extract_metadata(&self, body: &Value) -> Option<ProviderMetadata>;

    /// Fresh accumulator for one streamed response
    fn create_stream_extractor(&self) -> Box<dyn StreamMetadataExtractor>;
}

/// Accumulates provider metadata across the chunks of one stream
pub trait StreamMetadataExtractor: Send {
    /// Observe one raw chunk, including ones that fail to decode
    fn process_chunk(&mut self, chunk: &Value);

    /// Metadata gathered so far
    fn build_metadata(&self) -> Option<ProviderMetadata>;
}

/// Copies named top-level response fields into the provider's metadata entry
///
/// Useful for fields like `system_fingerprint` that the normalized result
/// does not model. In streams the last value seen for each field wins.
#[derive(Debug, Clone)]
pub struct ResponseFieldExtractor {
    provider: String,
    fields: Vec<String>,
}

impl ResponseFieldExtractor {
    /// Extract `fields` under the `provider` entry
    pub fn new(provider: impl Into<String>, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            provider: provider.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    fn collect_into(&self, body: &Value, found: &mut Map<String, Value>) {
        let Some(object) = body.as_object() else {
            return;
        };
        for field in &self.fields {
            if let Some(value) = object.get(field)
                && !value.is_null()
            {
                found.insert(field.clone(), value.clone());
            }
        }
    }

    fn wrap(&self, found: Map<String, Value>) -> Option<ProviderMetadata> {
        (!found.is_empty()).then(|| ProviderMetadata::from([(self.provider.clone(), found)]))
    }
}

impl MetadataExtractor for ResponseFieldExtractor {
    fn extract_metadata(&self, body: &Value) -> Option<ProviderMetadata> {
        let mut found = Map::new();
        self.collect_into(body, &mut found);
        self.wrap(found)
    }

    fn create_stream_extractor(&self) -> Box<dyn StreamMetadataExtractor> {
        Box::new(ResponseFieldStream {
            extractor: self.clone(),
            found: Map::new(),
        })
    }
}

struct ResponseFieldStream {
    extractor: ResponseFieldExtractor,
    found: Map<String, Value>,
}

impl StreamMetadataExtractor for ResponseFieldStream {
    fn process_chunk(&mut self, chunk: &Value) {
        self.extractor.collect_into(chunk, &mut self.found);
    }

    fn build_metadata(&self) -> Option<ProviderMetadata> {
        self.extractor.wrap(self.found.clone())
    }
}
