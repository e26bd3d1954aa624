//! Conversion between provider-agnostic types and the vendor wire format
//!
//! Everything here is pure: no I/O, no logging. Failures are returned before
//! any request is sent.

pub mod completion;
pub mod finish;
pub mod messages;
pub mod response;
pub mod tools;

use serde_json::{Map, Value};

pub use completion::{CompletionPrompt, to_completion_prompt};
pub use finish::map_finish_reason;
pub use messages::to_chat_messages;
pub use response::{DecodedResponse, decode_chat_response, decode_completion_response};
pub use tools::{PreparedTools, prepare_tools};

use crate::types::ProviderMetadata;

/// Fields stored under `provider` in a metadata bag
pub fn provider_fields(metadata: Option<&ProviderMetadata>, provider: &str) -> Map<String, Value> {
    metadata
        .and_then(|bags| bags.get(provider))
        .cloned()
        .unwrap_or_default()
}

/// Merge several metadata bags for one provider, later bags winning
pub(crate) fn merged_fields<'a>(
    bags: impl IntoIterator<Item = Option<&'a ProviderMetadata>>,
    provider: &str,
) -> Map<String, Value> {
    let mut merged = Map::new();
    for bag in bags {
        merged.extend(provider_fields(bag, provider));
    }
    merged
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn bag(provider: &str, key: &str, value: Value) -> ProviderMetadata {
        let mut fields = Map::new();
        fields.insert(key.to_owned(), value);
        ProviderMetadata::from([(provider.to_owned(), fields)])
    }

    #[test]
    fn provider_fields_ignores_other_providers() {
        let metadata = bag("other", "x", json!(1));
        assert!(provider_fields(Some(&metadata), "vendor").is_empty());
    }

    #[test]
    fn later_bags_win_on_conflict() {
        let message = bag("vendor", "x", json!(1));
        let part = bag("vendor", "x", json!(2));

        let merged = merged_fields([Some(&message), None, Some(&part)], "vendor");
        assert_eq!(merged.get("x"), Some(&json!(2)));
    }
}
