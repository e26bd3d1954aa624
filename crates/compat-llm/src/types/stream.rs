use std::pin::Pin;

use futures_util::Stream;

use super::prompt::ProviderMetadata;
use super::result::{FinishReason, ResponseMetadata, ToolCall, Usage};
use crate::error::LlmError;

/// Normalized event emitted while a response streams in
#[derive(Debug, Clone, PartialEq)]
pub enum StreamPart {
    /// Response identity, emitted once before any content
    ResponseMetadata(ResponseMetadata),
    /// Reasoning text fragment
    ReasoningDelta {
        /// The fragment
        delta: String,
    },
    /// Text fragment
    TextDelta {
        /// The fragment
        delta: String,
    },
    /// Fragment of tool-call arguments
    ToolCallDelta {
        /// Call identifier
        tool_call_id: String,
        /// Tool name
        tool_name: String,
        /// Argument text appended by this chunk
        args_text_delta: String,
    },
    /// Tool call whose arguments parsed as JSON
    ToolCall(ToolCall),
    /// Chunk that could not be decoded or carried a vendor error
    Error {
        /// What went wrong
        message: String,
    },
    /// Final part of a stream
    Finish {
        /// Last reported finish reason
        finish_reason: FinishReason,
        /// Last reported usage
        usage: Usage,
        /// Fields gathered by the metadata extractor
        provider_metadata: Option<ProviderMetadata>,
    },
}

/// Stream of normalized parts
///
/// An `Err` item is fatal and ends the stream.
pub type PartStream = Pin<Box<dyn Stream<Item = Result<StreamPart, LlmError>> + Send>>;
