//! CLI module for Gearchat.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Gearchat - Grounded Product Chat
///
/// A chat assistant for product recommendations that grounds every answer
/// in documents retrieved from a hosted product search index.
#[derive(Parser, Debug)]
#[command(name = "gearchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Emit span enter/exit telemetry in the logs
    #[arg(long, global = true)]
    pub enable_telemetry: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration and verify prompt assets
    Init,

    /// Ask a single product question and print the grounded answer
    Ask {
        /// Query to use to search products
        #[arg(
            short,
            long,
            default_value = "I need a new tent for 4 people, what would you recommend?"
        )]
        query: String,

        /// Chat model override
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start an interactive chat session
    Chat {
        /// Chat model override
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Batch evaluation over a JSONL dataset
    Eval {
        #[command(subcommand)]
        action: EvalAction,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum EvalAction {
    /// Replay dataset queries and write the augmented JSONL dataset
    Generate {
        /// Input JSONL file (defaults to chat_eval_data.jsonl in the asset dir)
        #[arg(short, long)]
        input: Option<String>,

        /// Output JSONL file
        #[arg(short, long, default_value = "./output_dataset.jsonl")]
        output: String,
    },

    /// Replay dataset queries, score responses, and write a report
    Run {
        /// Input JSONL file (defaults to chat_eval_data.jsonl in the asset dir)
        #[arg(short, long)]
        input: Option<String>,

        /// Output report file
        #[arg(short, long, default_value = "./eval_results.json")]
        output: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "chat.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Show configuration file path
    Path,
}
