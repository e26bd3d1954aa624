use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form side-channel fields, namespaced by provider name
///
/// The entry matching the configured provider is merged into the wire object
/// it is attached to, without validation.
pub type ProviderMetadata = HashMap<String, Map<String, Value>>;

/// Ordered conversation sent to the model
pub type Prompt = Vec<Message>;

/// Message in a provider-agnostic conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System instruction, only valid as the first message
    System {
        /// Instruction text
        content: String,
        /// Provider-specific fields
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_metadata: Option<ProviderMetadata>,
    },
    /// User turn
    User {
        /// Ordered content parts
        content: Vec<UserPart>,
        /// Provider-specific fields
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_metadata: Option<ProviderMetadata>,
    },
    /// Assistant turn, possibly requesting tool calls
    Assistant {
        /// Ordered content parts
        content: Vec<AssistantPart>,
        /// Provider-specific fields
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_metadata: Option<ProviderMetadata>,
    },
    /// Results for earlier tool calls
    Tool {
        /// One entry per answered tool call
        content: Vec<ToolResultPart>,
        /// Provider-specific fields
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_metadata: Option<ProviderMetadata>,
    },
}

impl Message {
    /// System message without metadata
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
            provider_metadata: None,
        }
    }

    /// User message holding a single text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::User {
            content: vec![UserPart::text(text)],
            provider_metadata: None,
        }
    }

    /// Assistant message holding a single text part
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::Assistant {
            content: vec![AssistantPart::Text {
                text: text.into(),
                provider_metadata: None,
            }],
            provider_metadata: None,
        }
    }

    /// Metadata attached to the message itself
    pub const fn provider_metadata(&self) -> Option<&ProviderMetadata> {
        match self {
            Self::System { provider_metadata, .. }
            | Self::User { provider_metadata, .. }
            | Self::Assistant { provider_metadata, .. }
            | Self::Tool { provider_metadata, .. } => provider_metadata.as_ref(),
        }
    }
}

/// Content part of a user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserPart {
    /// Plain text
    Text {
        /// The text
        text: String,
        /// Provider-specific fields
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_metadata: Option<ProviderMetadata>,
    },
    /// Image given by URL or inline bytes
    Image {
        /// Image location or data
        image: ImageSource,
        /// MIME type of inline bytes
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        /// Provider-specific fields
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_metadata: Option<ProviderMetadata>,
    },
    /// Arbitrary file attachment
    File {
        /// File URL or base64 data
        data: String,
        /// MIME type of the file
        mime_type: String,
        /// Provider-specific fields
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_metadata: Option<ProviderMetadata>,
    },
}

impl UserPart {
    /// Text part without metadata
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            provider_metadata: None,
        }
    }
}

/// Where an image comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// Remote or data URL, passed through as-is
    Url(String),
    /// Raw image bytes
    Bytes(Vec<u8>),
}

/// Content part of an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantPart {
    /// Generated text
    Text {
        /// The text
        text: String,
        /// Provider-specific fields
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_metadata: Option<ProviderMetadata>,
    },
    /// Tool invocation requested by the model
    ToolCall {
        /// Identifier used to match the result
        tool_call_id: String,
        /// Name of the tool
        tool_name: String,
        /// Arguments as a JSON value
        args: Value,
        /// Provider-specific fields
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_metadata: Option<ProviderMetadata>,
    },
}

/// Result of one tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultPart {
    /// Identifier of the answered tool call
    pub tool_call_id: String,
    /// Name of the tool
    pub tool_name: String,
    /// Tool output as a JSON value
    pub result: Value,
    /// Provider-specific fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_metadata: Option<ProviderMetadata>,
}
