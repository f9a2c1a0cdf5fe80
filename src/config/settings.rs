//! Configuration settings for Gearchat.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub chat: ChatSettings,
    pub search: SearchSettings,
    pub embedding: EmbeddingSettings,
    pub evaluation: EvaluationSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory containing prompt templates and evaluation data.
    pub asset_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Emit span enter/exit events in addition to log lines.
    pub enable_telemetry: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            asset_dir: "./assets".to_string(),
            log_level: "info".to_string(),
            enable_telemetry: false,
        }
    }
}

/// Chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Model for grounded chat responses.
    pub model: String,
    /// Upper bound on generated tokens per response.
    pub max_output_tokens: u32,
    /// Per-request timeout for upstream calls, in seconds.
    pub request_timeout_seconds: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_output_tokens: 512,
            request_timeout_seconds: 120,
        }
    }
}

/// Product search index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Base URL of the hosted search service.
    pub endpoint: String,
    /// Name of the product index to query.
    pub index: String,
    /// Environment variable holding the search API key.
    pub api_key_env: String,
    /// Number of documents to retrieve per turn.
    pub top_k: usize,
    /// Model used to rewrite the conversation into a search intent.
    pub intent_model: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            index: "products".to_string(),
            api_key_env: "SEARCH_API_KEY".to_string(),
            top_k: 5,
            intent_model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Batch evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSettings {
    /// Model used as the LLM judge for groundedness scoring.
    pub model: String,
    /// Minimum response length counted as a non-trivial answer.
    pub min_response_chars: usize,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            min_response_chars: 10,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::GearchatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gearchat")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded asset directory path.
    pub fn asset_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.asset_dir)
    }

    /// Read the search API key from the configured environment variable.
    pub fn search_api_key(&self) -> crate::error::Result<String> {
        match std::env::var(&self.search.api_key_env) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(crate::error::GearchatError::Config(format!(
                "{} is not set. Export the search API key before running.",
                self.search.api_key_env
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.chat.max_output_tokens, 512);
        assert_eq!(settings.search.top_k, 5);
        assert_eq!(settings.embedding.dimensions, 1536);
        assert!(!settings.general.enable_telemetry);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let path = PathBuf::from("/nonexistent/gearchat/config.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.chat.model, "gpt-4o-mini");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str("[chat]\nmodel = \"gpt-4o\"\n").unwrap();
        assert_eq!(settings.chat.model, "gpt-4o");
        assert_eq!(settings.chat.max_output_tokens, 512);
        assert_eq!(settings.evaluation.model, "gpt-4o");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut settings = Settings::default();
        settings.search.endpoint = "https://search.example.com".to_string();
        settings.save_to(&path).unwrap();

        let reloaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(reloaded.search.endpoint, "https://search.example.com");
    }
}
