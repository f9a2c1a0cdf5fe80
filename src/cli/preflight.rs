//! Pre-flight checks before expensive operations.
//!
//! Validates required configuration before starting operations that would
//! otherwise fail midway through a turn.

use crate::config::Settings;
use crate::error::{GearchatError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Chat turns need the OpenAI key and a configured search service.
    Chat,
    /// Evaluation additionally uses the judge model (same key).
    Eval,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Chat | Operation::Eval => {
            check_openai_key()?;
            check_search(settings)?;
        }
    }
    Ok(())
}

/// Check if the OpenAI API key is configured.
fn check_openai_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(GearchatError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(GearchatError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check that the search service is reachable in principle.
fn check_search(settings: &Settings) -> Result<()> {
    if settings.search.endpoint.is_empty() {
        return Err(GearchatError::Config(
            "search.endpoint is not configured. Run 'gearchat config set search.endpoint <url>'."
                .to_string(),
        ));
    }
    settings.search_api_key().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_endpoint_fails() {
        let settings = Settings::default();
        assert!(matches!(
            check_search(&settings),
            Err(GearchatError::Config(_))
        ));
    }
}
