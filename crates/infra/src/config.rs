//! Process configuration.
//!
//! Merges optional `config/default` and `config/{env}` files with
//! `TICKETDESK__*` environment variables (`__` separates nesting levels,
//! e.g. `TICKETDESK__REAPER__RETENTION_DAYS=7`).

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::workers::ReaperConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to build configuration: {0}")]
    Build(String),

    #[error("failed to deserialize configuration: {0}")]
    Deserialize(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Deployment environment; production suppresses fault details in responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReaperSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for ReaperSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            retention_days: default_retention_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub environment: Environment,
    /// HS256 secret for bearer verification. `None` means the caller picks a
    /// development fallback.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Postgres URL for the token store; in-memory when absent.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub reaper: ReaperSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            environment: Environment::default(),
            jwt_secret: None,
            database_url: None,
            reaper: ReaperSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration for the named environment (`development`, `production`, ...).
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TICKETDESK")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config = builder.build().map_err(|e| ConfigError::Build(e.to_string()))?;
        let parsed: AppConfig = config
            .try_deserialize()
            .map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.reaper.interval_secs == 0 {
            return Err(ConfigError::Invalid("reaper.interval_secs must be positive".into()));
        }
        if self.reaper.retention_days < 0 {
            return Err(ConfigError::Invalid("reaper.retention_days must not be negative".into()));
        }
        Ok(())
    }

    pub fn reaper_config(&self) -> ReaperConfig {
        ReaperConfig {
            interval: Duration::from_secs(self.reaper.interval_secs),
            retention: chrono::Duration::days(self.reaper.retention_days),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_retention_days() -> i64 {
    30
}
