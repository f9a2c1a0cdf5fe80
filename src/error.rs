//! Error types for Gearchat.

use thiserror::Error;

/// Library-level error type for Gearchat operations.
#[derive(Error, Debug)]
pub enum GearchatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt template error: {0}")]
    Template(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Completion failed: {0}")]
    Completion(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Gearchat operations.
pub type Result<T> = std::result::Result<T, GearchatError>;
