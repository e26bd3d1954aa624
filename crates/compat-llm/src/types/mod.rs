//! Provider-agnostic types for prompts, call options, results and stream parts
//!
//! Wire formats convert to and from these; nothing here knows about the
//! vendor's JSON layout.

pub mod call;
pub mod prompt;
pub mod result;
pub mod stream;

pub use call::{
    CallOptions, FunctionTool, InputFormat, Mode, ObjectGenerationMode, ResponseFormat, Tool, ToolChoice,
};
pub use prompt::{AssistantPart, ImageSource, Message, Prompt, ProviderMetadata, ToolResultPart, UserPart};
pub use result::{
    FinishReason, GenerateResult, RawCall, RawResponse, ResponseMetadata, StreamResult, ToolCall, Usage, Warning,
};
pub use stream::{PartStream, StreamPart};
