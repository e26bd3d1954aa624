//! Prompt to chat message array

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::merged_fields;
use crate::error::LlmError;
use crate::protocol::Extended;
use crate::protocol::chat::{
    CompatContentPart, CompatFunctionCall, CompatImageUrl, CompatMessage, CompatMessageBody, CompatToolCall,
    CompatUserContent,
};
use crate::types::{AssistantPart, ImageSource, Message, Prompt, UserPart};

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Convert a prompt into the vendor's chat message array
///
/// `provider` selects which provider metadata entry is merged into each
/// emitted object.
pub fn to_chat_messages(prompt: &Prompt, provider: &str) -> Result<Vec<CompatMessage>, LlmError> {
    ensure_system_first(prompt)?;

    let mut messages = Vec::with_capacity(prompt.len());
    for message in prompt {
        let message_metadata = message.provider_metadata();
        match message {
            Message::System { content, .. } => {
                messages.push(Extended::with_extensions(
                    CompatMessageBody::System {
                        content: content.clone(),
                    },
                    merged_fields([message_metadata], provider),
                ));
            }
            Message::User { content, .. } => {
                if let [UserPart::Text { text, provider_metadata }] = content.as_slice() {
                    messages.push(Extended::with_extensions(
                        CompatMessageBody::User {
                            content: CompatUserContent::Text(text.clone()),
                        },
                        merged_fields([message_metadata, provider_metadata.as_ref()], provider),
                    ));
                    continue;
                }

                let parts = content
                    .iter()
                    .map(|part| user_part(part, provider))
                    .collect::<Result<Vec<_>, _>>()?;
                messages.push(Extended::with_extensions(
                    CompatMessageBody::User {
                        content: CompatUserContent::Parts(parts),
                    },
                    merged_fields([message_metadata], provider),
                ));
            }
            Message::Assistant { content, .. } => {
                let mut text = String::new();
                let mut tool_call = None;
                for part in content {
                    match part {
                        AssistantPart::Text { text: fragment, .. } => text.push_str(fragment),
                        // Only the last tool call survives
                        AssistantPart::ToolCall {
                            tool_call_id,
                            tool_name,
                            args,
                            provider_metadata,
                        } => {
                            tool_call = Some(Extended::with_extensions(
                                CompatToolCall {
                                    id: tool_call_id.clone(),
                                    call_type: "function",
                                    function: CompatFunctionCall {
                                        name: tool_name.clone(),
                                        arguments: args.to_string(),
                                    },
                                },
                                merged_fields([provider_metadata.as_ref()], provider),
                            ));
                        }
                    }
                }

                messages.push(Extended::with_extensions(
                    CompatMessageBody::Assistant {
                        content: text,
                        tool_calls: tool_call.map(|call| vec![call]),
                    },
                    merged_fields([message_metadata], provider),
                ));
            }
            Message::Tool { content, .. } => {
                for result in content {
                    messages.push(Extended::with_extensions(
                        CompatMessageBody::Tool {
                            tool_call_id: result.tool_call_id.clone(),
                            content: result.result.to_string(),
                        },
                        merged_fields([message_metadata, result.provider_metadata.as_ref()], provider),
                    ));
                }
            }
        }
    }

    Ok(messages)
}

/// Reject system messages anywhere but the first position
pub(crate) fn ensure_system_first(prompt: &Prompt) -> Result<(), LlmError> {
    for message in prompt.iter().skip(1) {
        if let Message::System { content, .. } = message {
            return Err(LlmError::invalid_prompt(format!(
                "unexpected system message in prompt: {content}"
            )));
        }
    }
    Ok(())
}

fn user_part(part: &UserPart, provider: &str) -> Result<Extended<CompatContentPart>, LlmError> {
    match part {
        UserPart::Text { text, provider_metadata } => Ok(Extended::with_extensions(
            CompatContentPart::Text { text: text.clone() },
            merged_fields([provider_metadata.as_ref()], provider),
        )),
        UserPart::Image {
            image,
            mime_type,
            provider_metadata,
        } => {
            let url = match image {
                ImageSource::Url(url) => url.clone(),
                ImageSource::Bytes(bytes) => format!(
                    "data:{};base64,{}",
                    mime_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME),
                    STANDARD.encode(bytes)
                ),
            };
            Ok(Extended::with_extensions(
                CompatContentPart::ImageUrl {
                    image_url: CompatImageUrl { url },
                },
                merged_fields([provider_metadata.as_ref()], provider),
            ))
        }
        UserPart::File { .. } => Err(LlmError::unsupported("file content parts in user messages")),
    }
}
