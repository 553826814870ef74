//! Application configuration.
//!
//! Settings come from an optional `config.toml` and are then overridden by
//! environment variables (a `.env` file is loaded by `main` before this runs).

/// Database configuration and connection management
pub mod database;

/// Seeding of the fixed status reference table
pub mod statuses;

use crate::errors::{Error, Result};
use sea_orm::{DbBackend, IsolationLevel};
use serde::Deserialize;
use std::{path::Path, str::FromStr, time::Duration};
use tracing::{debug, info};

/// Default location of the optional configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Transaction isolation used by the order workflow.
///
/// Approval relies on row locks for correctness, so `ReadCommitted` is enough;
/// `Serializable` is accepted as a stricter alternative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Isolation {
    #[default]
    ReadCommitted,
    Serializable,
}

impl Isolation {
    /// Isolation level to request from the given backend.
    ///
    /// `SQLite` has no per-transaction isolation setting; writers are serialised
    /// by the database lock, so nothing is requested there.
    #[must_use]
    pub const fn level_for(self, backend: DbBackend) -> Option<IsolationLevel> {
        match backend {
            DbBackend::Sqlite => None,
            _ => match self {
                Self::ReadCommitted => Some(IsolationLevel::ReadCommitted),
                Self::Serializable => Some(IsolationLevel::Serializable),
            },
        }
    }
}

impl FromStr for Isolation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read_committed" | "readcommitted" => Ok(Self::ReadCommitted),
            "serializable" => Ok(Self::Serializable),
            other => Err(Error::Config {
                message: format!("Unknown transaction isolation '{other}'"),
            }),
        }
    }
}

/// Top-level application settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Connection string understood by `SeaORM`
    pub database_url: String,
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Isolation for workflow transactions
    pub transaction_isolation: Isolation,
    /// Upper bound for a single request, after which its transaction is rolled back
    pub request_timeout_secs: u64,
    /// Whether `main` inserts missing status reference values on startup
    pub seed_reference_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/storefront.sqlite?mode=rwc".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
            transaction_isolation: Isolation::ReadCommitted,
            request_timeout_secs: 30,
            seed_reference_data: true,
        }
    }
}

impl AppConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Applies overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(addr) = lookup("BIND_ADDRESS") {
            self.bind_address = addr;
        }
        if let Some(isolation) = lookup("TRANSACTION_ISOLATION") {
            self.transaction_isolation = isolation.parse()?;
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs.trim().parse().map_err(|e| Error::Config {
                message: format!("REQUEST_TIMEOUT_SECS must be a whole number of seconds: {e}"),
            })?;
        }
        if let Some(seed) = lookup("SEED_REFERENCE_DATA") {
            self.seed_reference_data = parse_bool(&seed)?;
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config {
            message: format!("Expected a boolean, got '{other}'"),
        }),
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Builds the effective configuration: `config.toml` if present, then environment overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    let mut config = if Path::new(DEFAULT_CONFIG_PATH).exists() {
        info!("Loading configuration from {}", DEFAULT_CONFIG_PATH);
        load_config(DEFAULT_CONFIG_PATH)?
    } else {
        debug!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
        AppConfig::default()
    };

    config.apply_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}
