//! Grounded prompt assembly.

use super::{Context, Document, Message};
use crate::config::{GroundedChatPrompt, Prompts};
use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Assembles the grounding system message from retrieved documents.
///
/// The template is read once from the asset directory; a missing or
/// malformed asset fails the load rather than a later turn.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    template: GroundedChatPrompt,
}

impl PromptAssembler {
    /// Load the grounded chat template from an asset directory.
    pub fn load(asset_dir: &Path) -> Result<Self> {
        let prompts = Prompts::load(asset_dir)?;
        Ok(Self {
            template: prompts.grounded,
        })
    }

    /// Create an assembler from an already-loaded template.
    pub fn new(template: GroundedChatPrompt) -> Self {
        Self { template }
    }

    /// Produce the grounding messages for a turn.
    ///
    /// Fills the `{{documents}}` slot with the retrieved documents and any
    /// other slot with string-valued context fields. An empty document set
    /// produces an ungrounded prompt with an empty documents section.
    pub fn assemble(&self, documents: &[Document], context: &Context) -> Vec<Message> {
        if documents.is_empty() {
            warn!("no documents retrieved, answering without grounding evidence");
        }

        let mut vars = HashMap::new();
        for (key, value) in context {
            if let Some(text) = value.as_str() {
                vars.insert(key.clone(), text.to_string());
            }
        }
        vars.insert("documents".to_string(), format_documents(documents));

        vec![Message::system(Prompts::render(&self.template.system, &vars))]
    }
}

/// Format retrieved documents for the prompt's document section.
fn format_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("## Document {}: {}\n{}", i + 1, doc.title, doc.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{MessageContent, Role};

    fn doc(title: &str, text: &str) -> Document {
        Document {
            id: String::new(),
            title: title.to_string(),
            text: text.to_string(),
            imagepath: None,
        }
    }

    #[test]
    fn test_assemble_renders_documents() {
        let assembler = PromptAssembler::new(GroundedChatPrompt::default());
        let docs = vec![
            doc("TrailMaster X4 Tent", "A 4-person tent with rainfly."),
            doc("Alpine Explorer Tent", "An 8-person tent for base camps."),
        ];
        let messages = assembler.assemble(&docs, &Context::new());

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::System);
        let MessageContent::Text(body) = &messages[0].content else {
            panic!("system message should be plain text");
        };
        assert!(body.contains("## Document 1: TrailMaster X4 Tent"));
        assert!(body.contains("## Document 2: Alpine Explorer Tent"));
        assert!(!body.contains("{{documents}}"));
    }

    #[test]
    fn test_assemble_fills_context_fields() {
        let assembler = PromptAssembler::new(GroundedChatPrompt {
            system: "Audience: {{audience}}\n{{documents}}".to_string(),
        });
        let mut context = Context::new();
        context.insert(
            "audience".to_string(),
            serde_json::Value::String("beginners".to_string()),
        );
        let messages = assembler.assemble(&[], &context);

        let MessageContent::Text(body) = &messages[0].content else {
            panic!("system message should be plain text");
        };
        assert!(body.starts_with("Audience: beginners"));
    }

    #[test]
    fn test_assemble_empty_documents() {
        let assembler = PromptAssembler::new(GroundedChatPrompt::default());
        let messages = assembler.assemble(&[], &Context::new());
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_load_missing_asset_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PromptAssembler::load(dir.path()).is_err());
    }
}
