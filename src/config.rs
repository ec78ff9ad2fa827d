//! Layered application settings.
//!
//! Sources, later ones winning: built-in defaults, an optional TOML file
//! (`nestegg.toml` in the working directory, or an explicit path), then
//! `NESTEGG__SECTION__KEY` environment variables. `DATABASE_URL` also sets
//! `database.url`.

use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;

use crate::history::PostgresConfig;

const DEFAULT_CONFIG_FILE: &str = "nestegg";
const ENV_PREFIX: &str = "NESTEGG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Without a URL, history lives in process memory.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub ensure_schema_on_start: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
            connect_timeout_secs: 5,
            idle_timeout_secs: 300,
            ensure_schema_on_start: true,
        }
    }
}

impl DatabaseConfig {
    pub fn postgres(&self) -> Option<PostgresConfig> {
        let url = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        Some(
            PostgresConfig::new(url)
                .with_max_connections(self.max_connections)
                .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
                .with_idle_timeout(Duration::from_secs(self.idle_timeout_secs)),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Request header an upstream auth proxy fills with the caller's account.
    pub header: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            header: String::from("x-auth-request-email"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: String::from("info"),
        }
    }
}

impl AppConfig {
    /// Load from `path` (required) or from an optional `nestegg.toml`, then
    /// apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if a source cannot be read or the merged
    /// values do not fit the expected types.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = match path {
            Some(path) => Config::builder().add_source(File::from(path).required(true)),
            None => Config::builder()
                .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };
        let mut config = Self::build(builder.add_source(env_source()))?;
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                config.database.url = Some(url);
            }
        }
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults, without consulting the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the TOML is malformed or mistyped.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        Ok(builder.build()?.try_deserialize()?)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}
