use std::path::Path;

use super::{schema::Config, validate::ConfigError};

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const CONFIG_PATH_ENV: &str = "FLEETWATCH_CONFIG";

/// `FLEETWATCH_CONFIG` when set and non-blank, otherwise `config.toml`.
pub fn config_path_from(env_value: Option<String>) -> String {
    env_value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

pub fn resolve_config_path() -> String {
    config_path_from(std::env::var(CONFIG_PATH_ENV).ok())
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref().display().to_string();
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    parse_config(&raw, &path)
}

/// Parses and validates; `origin` only labels parse errors.
pub fn parse_config(raw: &str, origin: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}
