//! Command implementations.

mod ask;
mod chat;
mod config;
mod eval;
mod init;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use eval::{run_eval, run_generate};
pub use init::run_init;
pub use serve::run_serve;
