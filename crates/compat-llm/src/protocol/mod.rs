//! Wire format types for OpenAI-compatible HTTP APIs
//!
//! Pure serde structs matching the vendor's JSON layout. Typed
//! deserialization doubles as response validation: anything that does not fit
//! these shapes is rejected at the boundary.

pub mod chat;
pub mod completion;

use std::ops::Deref;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Wire object with free-form provider fields merged on top
///
/// Extensions are written after the body's own fields, so on a key conflict
/// the extension wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Extended<T> {
    /// Typed fields
    pub body: T,
    /// Untyped fields merged into the serialized object
    pub extensions: Map<String, Value>,
}

impl<T> Extended<T> {
    /// Wrap a body without extensions
    pub fn new(body: T) -> Self {
        Self {
            body,
            extensions: Map::new(),
        }
    }

    /// Wrap a body with the given extensions
    pub const fn with_extensions(body: T, extensions: Map<String, Value>) -> Self {
        Self { body, extensions }
    }
}

impl<T> Deref for Extended<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.body
    }
}

impl<T: Serialize> Serialize for Extended<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.body).map_err(serde::ser::Error::custom)?;
        if let Value::Object(object) = &mut value {
            for (key, field) in &self.extensions {
                object.insert(key.clone(), field.clone());
            }
        }
        value.serialize(serializer)
    }
}

// -- Shared response types --

/// Token usage block
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CompatUsage {
    /// Prompt tokens
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    /// Completion tokens
    #[serde(default)]
    pub completion_tokens: Option<u64>,
}

/// Stream options sent with streaming requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompatStreamOptions {
    /// Ask the vendor to append a usage chunk
    pub include_usage: bool,
}

/// Error body returned by the vendor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatErrorResponse {
    /// Error details
    pub error: CompatErrorDetail,
}

/// Error details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatErrorDetail {
    /// Human-readable message
    pub message: String,
    /// Error category
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    /// Offending parameter
    #[serde(default)]
    pub param: Option<Value>,
    /// Vendor error code, string or number
    #[serde(default)]
    pub code: Option<Value>,
}

/// Payload of one server-sent event
///
/// The error shape is tried first since chunk fields are mostly optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CompatChunkPayload<T> {
    /// Vendor error embedded in the stream
    Error(CompatErrorResponse),
    /// Regular chunk
    Chunk(T),
}
