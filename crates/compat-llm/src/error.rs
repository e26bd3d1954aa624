use http::StatusCode;
use thiserror::Error;

/// Errors that can occur while adapting a call to an OpenAI-compatible API
#[derive(Debug, Error)]
pub enum LlmError {
    /// Prompt has a shape the vendor cannot represent
    #[error("invalid prompt: {message}")]
    InvalidPrompt { message: String },

    /// Requested feature is not available for this vendor or model type
    #[error("unsupported functionality: {functionality}")]
    UnsupportedFunctionality { functionality: String },

    /// Vendor returned data that violates the expected response shape
    #[error("invalid response data: {message}")]
    InvalidResponseData { message: String },

    /// Vendor answered with a non-success status
    #[error("API call failed with status {status}: {message}")]
    ApiCall {
        /// HTTP status returned by the vendor
        status: StatusCode,
        /// Message extracted from the vendor error body
        message: String,
        /// Raw response body
        body: String,
        /// Whether repeating the call may succeed
        retryable: bool,
    },

    /// Request could not be delivered
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Server-sent event stream could not be decoded
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Caller cancelled the request
    #[error("request aborted")]
    Aborted,

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LlmError {
    pub(crate) fn invalid_prompt(message: impl Into<String>) -> Self {
        Self::InvalidPrompt {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(functionality: impl Into<String>) -> Self {
        Self::UnsupportedFunctionality {
            functionality: functionality.into(),
        }
    }

    pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponseData {
            message: message.into(),
        }
    }

    /// Whether repeating the same call may succeed
    ///
    /// Argument-construction errors are deterministic and never retryable.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::ApiCall { retryable, .. } => *retryable,
            Self::Upstream(_) | Self::Streaming(_) => true,
            Self::InvalidPrompt { .. }
            | Self::UnsupportedFunctionality { .. }
            | Self::InvalidResponseData { .. }
            | Self::Aborted
            | Self::Internal(_) => false,
        }
    }
}
