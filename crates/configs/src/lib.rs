//! # configs
//!
//! Layered settings: `.env` file, then an optional `bucketlist.toml`, then
//! `BUCKETLIST__*` environment variables (e.g. `BUCKETLIST__DATABASE__URL`).

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const ENV_PREFIX: &str = "BUCKETLIST";
const DEFAULT_FILE: &str = "bucketlist";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub log: LogSettings,
    pub appeal: AppealSettings,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// May embed credentials for remote backends, so never logged.
    #[serde(deserialize_with = "secret_string")]
    pub url: SecretString,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive; `RUST_LOG` still wins when set.
    pub filter: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AppealSettings {
    pub min_len: usize,
    pub max_len: usize,
}

fn secret_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl Settings {
    fn validate(self) -> Result<Self, ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }
        if self.appeal.min_len > self.appeal.max_len {
            return Err(ConfigError::Invalid(format!(
                "appeal.min_len ({}) exceeds appeal.max_len ({})",
                self.appeal.min_len, self.appeal.max_len
            )));
        }
        Ok(self)
    }
}

fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Ok(config::Config::builder()
        .set_default("database.url", "sqlite://bucketlist.db")?
        .set_default("database.max_connections", 5)?
        .set_default("log.filter", "info")?
        .set_default("log.format", "pretty")?
        .set_default("appeal.min_len", 10)?
        .set_default("appeal.max_len", 1000)?)
}

/// Loads settings from the working directory and the environment.
pub fn load() -> Result<Settings, ConfigError> {
    load_from(None)
}

/// Like [`load`], reading `file` instead of `./bucketlist.toml`. An explicit
/// file must exist.
pub fn load_from(file: Option<&Path>) -> Result<Settings, ConfigError> {
    // Missing .env is the normal case outside development.
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "loaded .env");
    }

    let file_source = match file {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_FILE).required(false),
    };

    let settings: Settings = builder()?
        .add_source(file_source)
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()?;

    settings.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn from_toml(raw: &str) -> Result<Settings, ConfigError> {
        let settings: Settings = builder()?
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()
    }

    #[test]
    fn test_defaults_apply_without_sources() {
        let settings = from_toml("").unwrap();
        assert_eq!(settings.database.url.expose_secret(), "sqlite://bucketlist.db");
        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.log.format, LogFormat::Pretty);
        assert_eq!((settings.appeal.min_len, settings.appeal.max_len), (10, 1000));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let settings = from_toml(
            r#"
            [log]
            format = "json"
            filter = "bl_core=debug"

            [appeal]
            min_len = 1
            "#,
        )
        .unwrap();
        assert_eq!(settings.log.format, LogFormat::Json);
        assert_eq!(settings.log.filter, "bl_core=debug");
        assert_eq!(settings.appeal.min_len, 1);
    }

    #[test]
    fn test_inverted_appeal_bounds_are_rejected() {
        let err = from_toml("[appeal]\nmin_len = 50\nmax_len = 20\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_connections_are_rejected() {
        let err = from_toml("[database]\nmax_connections = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
