//! Configuration command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use crate::error::{GearchatError, Result};

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(&settings)
                .map_err(|e| GearchatError::Config(e.to_string()))?;
            println!("{}", content);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_value(&settings, key, value)?;
            updated.save()?;
            Output::success(&format!("Set {} = {}", key, value));
        }

        ConfigAction::Path => {
            println!("{}", Settings::default_config_path().display());
        }
    }

    Ok(())
}

/// Set a dotted key (e.g. "chat.model") to a value, re-validating the
/// whole settings structure.
fn set_value(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let mut root = toml::Value::try_from(settings)
        .map_err(|e| GearchatError::Config(e.to_string()))?;

    let mut segments: Vec<&str> = key.split('.').collect();
    let last = segments
        .pop()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GearchatError::InvalidInput(format!("invalid key: {}", key)))?;

    let mut current = &mut root;
    for segment in segments {
        current = current
            .as_table_mut()
            .and_then(|t| t.get_mut(segment))
            .ok_or_else(|| GearchatError::InvalidInput(format!("unknown section: {}", segment)))?;
    }

    let table = current
        .as_table_mut()
        .ok_or_else(|| GearchatError::InvalidInput(format!("{} is not a section", key)))?;
    table.insert(last.to_string(), parse_value(value));

    root.try_into()
        .map_err(|e| GearchatError::Config(format!("invalid value for {}: {}", key, e)))
}

/// Interpret the value as bool or integer when it parses as one.
fn parse_value(value: &str) -> toml::Value {
    if let Ok(b) = value.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(i) = value.parse::<i64>() {
        toml::Value::Integer(i)
    } else {
        toml::Value::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_string_value() {
        let settings = Settings::default();
        let updated = set_value(&settings, "chat.model", "gpt-4o").unwrap();
        assert_eq!(updated.chat.model, "gpt-4o");
    }

    #[test]
    fn test_set_integer_value() {
        let settings = Settings::default();
        let updated = set_value(&settings, "chat.max_output_tokens", "1024").unwrap();
        assert_eq!(updated.chat.max_output_tokens, 1024);
    }

    #[test]
    fn test_set_bool_value() {
        let settings = Settings::default();
        let updated = set_value(&settings, "general.enable_telemetry", "true").unwrap();
        assert!(updated.general.enable_telemetry);
    }

    #[test]
    fn test_set_unknown_section_fails() {
        let settings = Settings::default();
        assert!(set_value(&settings, "nope.key", "x").is_err());
    }

    #[test]
    fn test_set_wrong_type_fails() {
        let settings = Settings::default();
        assert!(set_value(&settings, "chat.max_output_tokens", "lots").is_err());
    }
}
