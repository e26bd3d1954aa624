//! Prompt to a single completion prompt string

use std::fmt::Write as _;

use super::messages::ensure_system_first;
use crate::error::LlmError;
use crate::types::{AssistantPart, InputFormat, Message, Prompt, UserPart};

/// Rendered completion prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionPrompt {
    /// Prompt text
    pub prompt: String,
    /// Stop sequences that keep the model from writing the next user turn
    pub stop_sequences: Option<Vec<String>>,
}

/// Render a prompt as a chat-style transcript
///
/// A bare prompt consisting of one user text part is passed through
/// unchanged.
pub fn to_completion_prompt(
    prompt: &Prompt,
    input_format: InputFormat,
    user_label: &str,
    assistant_label: &str,
) -> Result<CompletionPrompt, LlmError> {
    if input_format == InputFormat::Prompt
        && let [Message::User { content, .. }] = prompt.as_slice()
        && let [UserPart::Text { text, .. }] = content.as_slice()
    {
        return Ok(CompletionPrompt {
            prompt: text.clone(),
            stop_sequences: None,
        });
    }

    ensure_system_first(prompt)?;

    let mut rendered = String::new();
    let mut messages = prompt.as_slice();
    if let [Message::System { content, .. }, rest @ ..] = messages {
        rendered.push_str(content);
        rendered.push_str("\n\n");
        messages = rest;
    }

    for message in messages {
        match message {
            // Only reachable at index 0, which is consumed above
            Message::System { content, .. } => {
                return Err(LlmError::invalid_prompt(format!(
                    "unexpected system message in prompt: {content}"
                )));
            }
            Message::User { content, .. } => {
                let mut text = String::new();
                for part in content {
                    match part {
                        UserPart::Text { text: fragment, .. } => text.push_str(fragment),
                        UserPart::Image { .. } => return Err(LlmError::unsupported("images")),
                        UserPart::File { .. } => return Err(LlmError::unsupported("files")),
                    }
                }
                let _ = write!(rendered, "{user_label}:\n{text}\n\n");
            }
            Message::Assistant { content, .. } => {
                let mut text = String::new();
                for part in content {
                    match part {
                        AssistantPart::Text { text: fragment, .. } => text.push_str(fragment),
                        AssistantPart::ToolCall { .. } => return Err(LlmError::unsupported("tool-call messages")),
                    }
                }
                let _ = write!(rendered, "{assistant_label}:\n{text}\n\n");
            }
            Message::Tool { .. } => return Err(LlmError::unsupported("tool messages")),
        }
    }

    let _ = write!(rendered, "{assistant_label}:\n");

    Ok(CompletionPrompt {
        prompt: rendered,
        stop_sequences: Some(vec![format!("\n{user_label}:")]),
    })
}
