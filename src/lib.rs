//! Gearchat - Grounded Product Chat
//!
//! A retrieval-augmented chat assistant for product recommendations. Each
//! turn retrieves relevant product documents from a hosted search index,
//! assembles a grounded prompt (attaching any product images as inline
//! encoded content), calls a hosted chat-completion model, and returns the
//! assistant reply together with updated conversation context for
//! multi-turn use.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt template management
//! - `chat` - Message model, prompt assembly, image attachment, completion,
//!   the conversation engine, and per-session state
//! - `retrieval` - Grounding-document retrieval from the search index
//! - `embedding` - Query embedding generation
//! - `eval` - Offline batch evaluation over JSONL datasets
//! - `cli` - Command-line interface and HTTP API server
//!
//! # Example
//!
//! ```rust,no_run
//! use gearchat::chat::{ChatEngine, Context, ConversationHistory};
//! use gearchat::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let engine = ChatEngine::from_settings(&settings)?;
//!
//!     let mut history = ConversationHistory::new();
//!     let turn = engine
//!         .converse("I need a new tent for 4 people", &mut history, Context::new())
//!         .await?;
//!     println!("{:?}", turn.message);
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod openai;
pub mod retrieval;

pub use error::{GearchatError, Result};
