//! Incremental reconstruction of normalized parts from server-sent chunks
//!
//! Each stream owns one processor. Chunks are handled strictly in arrival
//! order and to completion before the next one is polled, so no locking is
//! involved. Malformed chunks become [`StreamPart::Error`] items and the
//! stream keeps going; only transport failures and malformed tool-call deltas
//! end it early.

pub mod chat;
pub mod completion;
pub mod simulate;

use std::collections::VecDeque;
use std::pin::Pin;

use futures_util::{Stream, StreamExt, stream};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

pub use chat::ChatStreamProcessor;
pub use completion::CompletionStreamProcessor;
pub use simulate::simulate_stream;

use crate::convert::map_finish_reason;
use crate::convert::response::{response_metadata, usage_from};
use crate::error::LlmError;
use crate::metadata::StreamMetadataExtractor;
use crate::protocol::{CompatChunkPayload, CompatUsage};
use crate::types::{FinishReason, PartStream, StreamPart, Usage};

/// Raw `data:` payloads of a server-sent event stream
pub type EventStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Sentinel some vendors send after the last chunk
const DONE_SENTINEL: &str = "[DONE]";

/// Turns chunk payloads into stream parts
pub trait ChunkProcessor: Send {
    /// Handle one payload
    ///
    /// An `Err` item is fatal: it is forwarded and the stream ends.
    fn process(&mut self, data: &str) -> Vec<Result<StreamPart, LlmError>>;

    /// Final part, called once when input ends normally
    fn flush(&mut self) -> StreamPart;
}

/// Lifecycle of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// No chunk decoded yet, metadata not emitted
    AwaitingFirstChunk,
    /// Metadata emitted, chunks flowing
    Streaming,
    /// Finish part emitted
    Flushed,
}

/// State shared by the chat and completion processors
pub(crate) struct StreamState {
    phase: StreamPhase,
    finish_reason: FinishReason,
    usage: Usage,
    extractor: Option<Box<dyn StreamMetadataExtractor>>,
}

impl StreamState {
    pub(crate) fn new(extractor: Option<Box<dyn StreamMetadataExtractor>>) -> Self {
        Self {
            phase: StreamPhase::AwaitingFirstChunk,
            finish_reason: FinishReason::Unknown,
            usage: Usage::default(),
            extractor,
        }
    }

    pub(crate) const fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// Decode a payload into a typed chunk
    ///
    /// Parse failures and embedded vendor errors are pushed as error parts and
    /// mark the stream as errored.
    pub(crate) fn decode<T: DeserializeOwned>(
        &mut self,
        data: &str,
        parts: &mut Vec<Result<StreamPart, LlmError>>,
    ) -> Option<T> {
        let value = match serde_json::from_str::<Value>(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, data = %data, "unparseable stream chunk");
                parts.push(Ok(self.record_error(e.to_string())));
                return None;
            }
        };

        if let Some(extractor) = self.extractor.as_mut() {
            extractor.process_chunk(&value);
        }

        match serde_json::from_value::<CompatChunkPayload<T>>(value) {
            Ok(CompatChunkPayload::Chunk(chunk)) => Some(chunk),
            Ok(CompatChunkPayload::Error(err)) => {
                tracing::debug!(message = %err.error.message, "vendor error in stream");
                parts.push(Ok(self.record_error(err.error.message)));
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, data = %data, "stream chunk has unexpected shape");
                parts.push(Ok(self.record_error(e.to_string())));
                None
            }
        }
    }

    /// Emit response metadata for the first decoded chunk
    pub(crate) fn begin(
        &mut self,
        id: Option<String>,
        model: Option<String>,
        created: Option<i64>,
        parts: &mut Vec<Result<StreamPart, LlmError>>,
    ) {
        if self.phase == StreamPhase::AwaitingFirstChunk {
            self.phase = StreamPhase::Streaming;
            parts.push(Ok(StreamPart::ResponseMetadata(response_metadata(id, model, created))));
        }
    }

    pub(crate) fn record_usage(&mut self, usage: Option<CompatUsage>) {
        if usage.is_some() {
            self.usage = usage_from(usage);
        }
    }

    pub(crate) fn record_finish_reason(&mut self, reason: Option<&str>) {
        if reason.is_some() {
            self.finish_reason = map_finish_reason(reason);
        }
    }

    fn record_error(&mut self, message: String) -> StreamPart {
        self.finish_reason = FinishReason::Error;
        StreamPart::Error { message }
    }

    pub(crate) fn flush(&mut self) -> StreamPart {
        self.phase = StreamPhase::Flushed;
        StreamPart::Finish {
            finish_reason: self.finish_reason,
            usage: self.usage,
            provider_metadata: self.extractor.as_ref().and_then(|e| e.build_metadata()),
        }
    }
}

struct Driver<P> {
    events: EventStream,
    processor: P,
    pending: VecDeque<Result<StreamPart, LlmError>>,
    done: bool,
}

/// Run a processor over an event stream
///
/// Ends with exactly one `Finish` part when input ends normally. Transport
/// errors and fatal processor errors end the stream without one. When `abort`
/// fires the stream stops silently.
pub fn reconstruct<P>(events: EventStream, processor: P, abort: Option<CancellationToken>) -> PartStream
where
    P: ChunkProcessor + 'static,
{
    let driver = Driver {
        events,
        processor,
        pending: VecDeque::new(),
        done: false,
    };

    let parts = stream::unfold(driver, |mut driver| async move {
        loop {
            if let Some(item) = driver.pending.pop_front() {
                if item.is_err() {
                    driver.pending.clear();
                    driver.done = true;
                }
                return Some((item, driver));
            }
            if driver.done {
                return None;
            }

            match driver.events.next().await {
                Some(Ok(data)) => {
                    let data = data.trim();
                    if data.is_empty() || data == DONE_SENTINEL {
                        continue;
                    }
                    tracing::trace!(chunk = %data, "stream chunk");
                    driver.pending.extend(driver.processor.process(data));
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "stream transport failed");
                    driver.done = true;
                    return Some((Err(e), driver));
                }
                None => {
                    driver.done = true;
                    driver.pending.push_back(Ok(driver.processor.flush()));
                }
            }
        }
    });

    match abort {
        Some(token) => parts.take_until(token.cancelled_owned()).boxed(),
        None => parts.boxed(),
    }
}
