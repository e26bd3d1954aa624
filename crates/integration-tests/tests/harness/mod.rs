#![allow(dead_code)]

pub mod mock_vendor;

use compat_llm::types::PartStream;
use compat_llm::{CompatProvider, LlmError, ProviderSettings, StreamPart};
use futures_util::StreamExt;

/// Provider named `mock` pointing at the mock vendor
pub fn provider(base_url: &str) -> CompatProvider {
    CompatProvider::new(ProviderSettings::new("mock", base_url)).unwrap()
}

/// Provider built from settings adjusted by `configure`
pub fn provider_with(base_url: &str, configure: impl FnOnce(&mut ProviderSettings)) -> CompatProvider {
    let mut settings = ProviderSettings::new("mock", base_url);
    configure(&mut settings);
    CompatProvider::new(settings).unwrap()
}

/// Drain a part stream, failing on any `Err` item
pub async fn collect_parts(stream: PartStream) -> Vec<StreamPart> {
    let items: Vec<Result<StreamPart, LlmError>> = stream.collect().await;
    items.into_iter().map(Result::unwrap).collect()
}

/// Concatenated text deltas
pub fn streamed_text(parts: &[StreamPart]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            StreamPart::TextDelta { delta } => Some(delta.as_str()),
            _ => None,
        })
        .collect()
}
