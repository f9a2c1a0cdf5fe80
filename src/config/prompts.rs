//! Prompt templates for Gearchat.
//!
//! The grounded chat template is a required asset loaded from the configured
//! asset directory; the intent mapping prompt falls back to a built-in
//! default when no override file is present.

use crate::error::{GearchatError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// File name of the required grounded chat template asset.
pub const GROUNDED_CHAT_ASSET: &str = "grounded_chat.toml";

/// File name of the optional intent mapping prompt asset.
pub const INTENT_MAPPING_ASSET: &str = "intent_mapping.toml";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub grounded: GroundedChatPrompt,
    pub intent: IntentPrompt,
}

/// System template for the grounded product chat.
///
/// The `{{documents}}` slot is filled with the retrieved product documents;
/// any other `{{key}}` slot is filled from string-valued context fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundedChatPrompt {
    pub system: String,
}

impl Default for GroundedChatPrompt {
    fn default() -> Self {
        Self {
            system: r#"You are an AI assistant helping users with queries related to outdoor and camping gear and clothing.
If the question is not related to outdoor or camping gear and clothing, just say "Sorry, I can only answer queries related to outdoor and camping gear and clothing. So, how can I help?"
Don't try to make up any answers.
If the question is related to outdoor or camping gear and clothing but vague, ask clarifying questions instead of referencing documents.
If the question is general, for example it uses "it" or "they", ask the user to specify what product they are asking about.
Use the following product documents to answer questions as completely, correctly, and concisely as possible.
Do not add document references in the response.

# Documents

{{documents}}"#
                .to_string(),
        }
    }
}

/// Prompt for rewriting the conversation into a search intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentPrompt {
    pub system: String,
    pub user: String,
}

impl Default for IntentPrompt {
    fn default() -> Self {
        Self {
            system: r#"You are an AI assistant reading the current user query and the conversation history.
Infer the intent the user is expressing and respond with a single concise search query that would retrieve the most relevant product documents.
Resolve pronouns like "it" or "they" using the conversation history.
Respond with the search query only, no explanation and no quotes."#
                .to_string(),
            user: r#"Conversation:
{{conversation}}

Current query: {{query}}

Search query:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from an asset directory.
    ///
    /// The grounded chat template is required; a missing or malformed file
    /// is a fatal template error. The intent mapping prompt is optional and
    /// falls back to the built-in default.
    pub fn load(asset_dir: &Path) -> Result<Self> {
        let grounded_path = asset_dir.join(GROUNDED_CHAT_ASSET);
        let content = std::fs::read_to_string(&grounded_path).map_err(|e| {
            GearchatError::Template(format!(
                "failed to read {}: {}",
                grounded_path.display(),
                e
            ))
        })?;
        let grounded: GroundedChatPrompt = toml::from_str(&content).map_err(|e| {
            GearchatError::Template(format!(
                "failed to parse {}: {}",
                grounded_path.display(),
                e
            ))
        })?;

        let intent_path = asset_dir.join(INTENT_MAPPING_ASSET);
        let intent = if intent_path.exists() {
            let content = std::fs::read_to_string(&intent_path)?;
            toml::from_str(&content).map_err(|e| {
                GearchatError::Template(format!(
                    "failed to parse {}: {}",
                    intent_path.display(),
                    e
                ))
            })?
        } else {
            IntentPrompt::default()
        };

        Ok(Self { grounded, intent })
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.grounded.system.contains("{{documents}}"));
        assert!(prompts.intent.user.contains("{{query}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Searching for {{query}} ({{count}} hits).";
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "tents".to_string());
        vars.insert("count".to_string(), "3".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Searching for tents (3 hits).");
    }

    #[test]
    fn test_load_missing_grounded_template_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Prompts::load(dir.path()).unwrap_err();
        assert!(matches!(err, GearchatError::Template(_)));
    }

    #[test]
    fn test_load_malformed_grounded_template_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(GROUNDED_CHAT_ASSET), "system = [not toml").unwrap();
        let err = Prompts::load(dir.path()).unwrap_err();
        assert!(matches!(err, GearchatError::Template(_)));
    }

    #[test]
    fn test_load_grounded_template_from_asset_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(GROUNDED_CHAT_ASSET),
            "system = \"Answer with {{documents}}\"\n",
        )
        .unwrap();
        let prompts = Prompts::load(dir.path()).unwrap();
        assert_eq!(prompts.grounded.system, "Answer with {{documents}}");
        // Intent prompt falls back to the default when no override exists.
        assert!(!prompts.intent.system.is_empty());
    }
}
