use super::{ChunkProcessor, StreamState};
use crate::error::LlmError;
use crate::metadata::StreamMetadataExtractor;
use crate::protocol::completion::CompatCompletionChunk;
use crate::types::StreamPart;

/// Reconstructs text from completion chunks
pub struct CompletionStreamProcessor {
    state: StreamState,
}

impl CompletionStreamProcessor {
    /// Processor with an optional metadata accumulator
    pub fn new(extractor: Option<Box<dyn StreamMetadataExtractor>>) -> Self {
        Self {
            state: StreamState::new(extractor),
        }
    }
}

impl ChunkProcessor for CompletionStreamProcessor {
    fn process(&mut self, data: &str) -> Vec<Result<StreamPart, LlmError>> {
        let mut parts = Vec::new();
        let Some(chunk) = self.state.decode::<CompatCompletionChunk>(data, &mut parts) else {
            return parts;
        };

        self.state.begin(chunk.id, chunk.model, chunk.created, &mut parts);
        self.state.record_usage(chunk.usage);

        if let Some(choice) = chunk.choices.into_iter().next() {
            self.state.record_finish_reason(choice.finish_reason.as_deref());
            if let Some(text) = choice.text {
                parts.push(Ok(StreamPart::TextDelta { delta: text }));
            }
        }

        parts
    }

    fn flush(&mut self) -> StreamPart {
        self.state.flush()
    }
}
