//! Interactive chat command.

use crate::chat::{ChatEngine, Context, ConversationHistory};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
///
/// The REPL owns one session's history/context pair. A failed turn prints
/// the error and leaves the conversation state untouched, so the same
/// question can be asked again without duplicating the user turn.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> crate::error::Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        return Err(e);
    }

    if let Some(model) = model {
        settings.chat.model = model;
    }

    let engine = ChatEngine::from_settings(&settings)?;

    let mut history = ConversationHistory::new();
    let mut context = Context::new();

    println!("\n{}", style("Gearchat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about products, or 'exit' to quit. Use 'clear' to reset the conversation.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            history.clear();
            context.clear();
            Output::info("Conversation cleared.");
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        match engine.converse(input, &mut history, context.clone()).await {
            Ok(turn) => {
                spinner.finish_and_clear();
                context = turn.context;
                if let Some(answer) = turn.message.content.as_text() {
                    println!("\n{} {}\n", style("Gearchat:").cyan().bold(), answer);
                }
            }
            Err(e) => {
                spinner.finish_and_clear();
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
