use std::collections::HashMap;
use thiserror::Error;

/// Seed values the journal needs at construction time.
///
/// The default version created alongside every ledger is looked up by this
/// injected name, never by a convention scattered across call sites.
#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Name given to the version created with each new ledger.
    pub default_version_name: String,
    /// Starting balance for equity-curve simulation.
    pub starting_balance: f64,
}

impl Default for JournalConfig {
    fn default() -> Self {
        JournalConfig {
            default_version_name: "Default".to_string(),
            starting_balance: 10_000.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl JournalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = JournalConfig::default();

        let default_version_name = env_map
            .get("DEFAULT_VERSION_NAME")
            .cloned()
            .unwrap_or(defaults.default_version_name);
        if default_version_name.is_empty() {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_VERSION_NAME".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let starting_balance = match env_map.get("STARTING_BALANCE") {
            Some(raw) => raw.parse::<f64>().ok().filter(|b| *b > 0.0).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "STARTING_BALANCE".to_string(),
                    "must be a positive number".to_string(),
                )
            })?,
            None => defaults.starting_balance,
        };

        Ok(JournalConfig {
            default_version_name,
            starting_balance,
        })
    }
}
