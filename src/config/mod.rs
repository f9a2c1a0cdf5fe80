//! Configuration module for Gearchat.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{
    GroundedChatPrompt, IntentPrompt, Prompts, GROUNDED_CHAT_ASSET, INTENT_MAPPING_ASSET,
};
pub use settings::{
    ChatSettings, EmbeddingSettings, EvaluationSettings, GeneralSettings, SearchSettings, Settings,
};
