//! Ask command implementation.

use crate::chat::{ChatEngine, Context, ConversationHistory, Document, GROUNDING_DATA_KEY};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command: one grounded turn, then print answer and sources.
pub async fn run_ask(query: &str, model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.chat.model = model;
    }

    let engine = ChatEngine::from_settings(&settings)?;

    let spinner = Output::spinner("Searching products...");

    let mut history = ConversationHistory::new();
    match engine.converse(query, &mut history, Context::new()).await {
        Ok(turn) => {
            spinner.finish_and_clear();

            if let Some(answer) = turn.message.content.as_text() {
                println!("\n{}\n", answer);
            }

            let documents: Vec<Document> = turn
                .context
                .get(GROUNDING_DATA_KEY)
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            if !documents.is_empty() {
                Output::header("Grounding documents");
                for doc in &documents {
                    Output::list_item(&doc.title);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
