use crate::types::FinishReason;

/// Normalize a vendor finish reason
///
/// Only the exact strings `stop`, `length` and `tool_calls` are recognized.
pub fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("tool_calls") => FinishReason::ToolCalls,
        _ => FinishReason::Unknown,
    }
}
