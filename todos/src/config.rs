//! Configuration management for the todos binary.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::gateway::DEFAULT_LIST_LIMIT;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {key}: {value:?}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Raw value found
        value: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// `SQLite` connection URL (`TODOS_DATABASE_URL`)
    pub database_url: String,
    /// Quiet period before completed todos sink, in milliseconds (`TODOS_RESORT_DELAY_MS`)
    pub resort_delay_ms: u64,
    /// Maximum number of todos loaded (`TODOS_LIST_LIMIT`)
    pub list_limit: usize,
    /// Seed an empty database with the default todos (`TODOS_SEED_DEFAULTS`)
    pub seed_defaults: bool,
    /// How long shutdown waits for running effects, in seconds (`TODOS_SHUTDOWN_TIMEOUT_SECS`)
    pub shutdown_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://todos.db?mode=rwc".to_string(),
            resort_delay_ms: 1000,
            list_limit: DEFAULT_LIST_LIMIT,
            seed_defaults: true,
            shutdown_timeout_secs: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Falls back to [`Config::default`] with a warning if any variable is
    /// malformed. Use [`Config::try_from_env`] to surface the error instead.
    #[must_use]
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|error| {
            tracing::warn!(%error, "Ignoring environment, using default configuration");
            Self::default()
        })
    }

    /// Load configuration from environment variables, rejecting malformed values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a variable that does not parse.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a value that does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            database_url: lookup("TODOS_DATABASE_URL").unwrap_or(defaults.database_url),
            resort_delay_ms: parsed(&lookup, "TODOS_RESORT_DELAY_MS")?
                .unwrap_or(defaults.resort_delay_ms),
            list_limit: parsed(&lookup, "TODOS_LIST_LIMIT")?.unwrap_or(defaults.list_limit),
            seed_defaults: parsed(&lookup, "TODOS_SEED_DEFAULTS")?
                .unwrap_or(defaults.seed_defaults),
            shutdown_timeout_secs: parsed(&lookup, "TODOS_SHUTDOWN_TIMEOUT_SECS")?
                .unwrap_or(defaults.shutdown_timeout_secs),
        })
    }

    /// Re-sort delay as a `Duration`
    #[must_use]
    pub const fn resort_delay(&self) -> Duration {
        Duration::from_millis(self.resort_delay_ms)
    }

    /// Shutdown timeout as a `Duration`
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value })
        })
        .transpose()
}
