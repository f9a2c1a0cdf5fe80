//! Hosted chat-completion invocation.

use super::{ContentPart, Message, MessageContent, Role};
use crate::config::ChatSettings;
use crate::error::{GearchatError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
    ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageUrlArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Trait for chat-completion backends.
///
/// One call sends the fully assembled message sequence upstream and yields
/// exactly one assistant message. Failures are terminal for the turn; no
/// retry is attempted.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<Message>;
}

/// OpenAI-backed completion client.
pub struct OpenAiCompletion {
    client: async_openai::Client<OpenAIConfig>,
    model: String,
    max_output_tokens: u32,
}

impl OpenAiCompletion {
    /// Create a completion client from chat settings.
    pub fn new(settings: &ChatSettings) -> Self {
        Self {
            client: create_client_with_timeout(Duration::from_secs(
                settings.request_timeout_seconds,
            )),
            model: settings.model.clone(),
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletion {
    #[instrument(skip(self, messages), fields(count = messages.len(), model = %self.model))]
    async fn complete(&self, messages: &[Message]) -> Result<Message> {
        let request_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(request_messages)
            .max_completion_tokens(self.max_output_tokens)
            .build()
            .map_err(|e| GearchatError::Completion(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| GearchatError::OpenAI(format!("Chat API error: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| GearchatError::Completion("empty response from model".to_string()))?;

        debug!("received assistant response ({} chars)", content.len());
        Ok(Message::assistant(content))
    }
}

/// Convert a chat message into the OpenAI request representation.
fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    match (&message.role, &message.content) {
        (Role::System, MessageContent::Text(text)) => Ok(ChatCompletionRequestSystemMessageArgs::default()
            .content(text.as_str())
            .build()
            .map_err(|e| GearchatError::Completion(e.to_string()))?
            .into()),
        (Role::Assistant, MessageContent::Text(text)) => {
            Ok(ChatCompletionRequestAssistantMessageArgs::default()
                .content(text.as_str())
                .build()
                .map_err(|e| GearchatError::Completion(e.to_string()))?
                .into())
        }
        (Role::User, MessageContent::Text(text)) => Ok(ChatCompletionRequestUserMessageArgs::default()
            .content(text.as_str())
            .build()
            .map_err(|e| GearchatError::Completion(e.to_string()))?
            .into()),
        (Role::User, MessageContent::Parts(parts)) => {
            let parts = parts
                .iter()
                .map(to_user_content_part)
                .collect::<Result<Vec<_>>>()?;
            Ok(ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(parts))
                .build()
                .map_err(|e| GearchatError::Completion(e.to_string()))?
                .into())
        }
        (role, MessageContent::Parts(_)) => Err(GearchatError::InvalidInput(format!(
            "multi-part content is only valid for user messages, got {:?}",
            role
        ))),
    }
}

fn to_user_content_part(part: &ContentPart) -> Result<ChatCompletionRequestUserMessageContentPart> {
    match part {
        ContentPart::Text { text } => Ok(ChatCompletionRequestMessageContentPartTextArgs::default()
            .text(text.as_str())
            .build()
            .map_err(|e| GearchatError::Completion(e.to_string()))?
            .into()),
        ContentPart::ImageUrl { image_url } => {
            let url = ImageUrlArgs::default()
                .url(image_url.url.as_str())
                .build()
                .map_err(|e| GearchatError::Completion(e.to_string()))?;
            Ok(ChatCompletionRequestMessageContentPartImageArgs::default()
                .image_url(url)
                .build()
                .map_err(|e| GearchatError::Completion(e.to_string()))?
                .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ImageUrl;

    #[test]
    fn test_text_message_conversion() {
        let converted = to_request_message(&Message::user("hello")).unwrap();
        let json = serde_json::to_value(&converted).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn test_image_message_conversion() {
        let message = Message::user_parts(vec![ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: "data:image/jpeg;base64,abc".to_string(),
            },
        }]);
        let converted = to_request_message(&message).unwrap();
        let json = serde_json::to_value(&converted).unwrap();
        assert_eq!(json["content"][0]["type"], "image_url");
        assert_eq!(json["content"][0]["image_url"]["url"], "data:image/jpeg;base64,abc");
    }

    #[test]
    fn test_parts_rejected_for_system_role() {
        let message = Message {
            role: Role::System,
            content: MessageContent::Parts(vec![ContentPart::Text {
                text: "nope".to_string(),
            }]),
        };
        assert!(to_request_message(&message).is_err());
    }
}
