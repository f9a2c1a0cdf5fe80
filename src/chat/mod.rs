//! Grounded chat: message model, prompt assembly, and the conversation engine.
//!
//! The wire shapes of [`Message`] and [`ContentPart`] match the OpenAI
//! chat-completions API so that histories can be logged, replayed, and sent
//! upstream without translation layers.

mod completion;
mod engine;
mod images;
mod prompt;
mod session;

pub use completion::{CompletionClient, OpenAiCompletion};
pub use engine::{ChatEngine, Turn};
pub use images::append_image_message;
pub use prompt::PromptAssembler;
pub use session::{Session, SessionStore};

use serde::{Deserialize, Serialize};

/// Speaker role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// An inline image reference, carried as a base64 data URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One element of a multi-part message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Message body: either plain text or a list of content parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// The text of the body, if it is plain text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(t) => Some(t),
            MessageContent::Parts(_) => None,
        }
    }
}

/// A single chat message. Ordered sequences of these form the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// A user message whose body is a list of content parts.
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}

/// A retrieved product document used as grounding evidence.
///
/// Immutable once returned by the retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier in the search index.
    #[serde(default)]
    pub id: String,
    /// Product title.
    #[serde(default)]
    pub title: String,
    /// Document body used for grounding.
    #[serde(alias = "content")]
    pub text: String,
    /// Optional path to a product image on disk.
    #[serde(default)]
    pub imagepath: Option<String>,
}

/// Opaque turn-to-turn state, threaded from one turn's output to the next
/// turn's input. The retriever records its results under `grounding_data`.
pub type Context = serde_json::Map<String, serde_json::Value>;

/// Ordered, append-only conversation history for one session.
pub type ConversationHistory = Vec<Message>;

/// Context key under which retrieved documents are recorded.
pub const GROUNDING_DATA_KEY: &str = "grounding_data";

/// Find the text of the most recent user message, if any.
pub fn last_user_query(history: &[Message]) -> Option<&str> {
    history
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .and_then(|m| m.content.as_text())
}
