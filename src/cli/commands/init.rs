//! Init command implementation.

use crate::cli::Output;
use crate::config::{Settings, GROUNDED_CHAT_ASSET};
use crate::error::Result;

/// Run the init command: write the default config and verify assets.
pub fn run_init(settings: &Settings) -> Result<()> {
    Output::header("Gearchat Init");

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config exists at {}", config_path.display()));
    } else {
        settings.save()?;
        Output::success(&format!("Wrote default config to {}", config_path.display()));
    }

    let grounded = settings.asset_dir().join(GROUNDED_CHAT_ASSET);
    if grounded.exists() {
        Output::success(&format!("Found prompt template {}", grounded.display()));
    } else {
        Output::warning(&format!(
            "Missing prompt template {}. Chat commands will fail until it exists.",
            grounded.display()
        ));
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        Output::success("OPENAI_API_KEY is set");
    } else {
        Output::warning("OPENAI_API_KEY is not set");
    }

    if settings.search.endpoint.is_empty() {
        Output::warning("search.endpoint is not configured");
    } else {
        Output::success(&format!("Search endpoint: {}", settings.search.endpoint));
    }

    Ok(())
}
