//! Application configuration.

use serde::Deserialize;
use std::path::Path;
use validator::{Validate, ValidationError};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Vote store configuration.
    #[serde(default)]
    pub votes: VoteConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`postgres://...` or `sqlite://...`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Vote store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct VoteConfig {
    /// Name of the table holding vote records.
    #[serde(default = "default_vote_table")]
    #[validate(length(min = 1, max = 48), custom(function = "validate_table_name"))]
    pub table: String,
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self {
            table: default_vote_table(),
        }
    }
}

impl VoteConfig {
    /// Create a vote configuration for a custom table name.
    #[must_use]
    pub fn with_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

/// Longest accepted vote table name. Derived index names
/// (`idx_{table}_created_at`) must stay within Postgres's 63-byte identifiers.
pub const MAX_TABLE_NAME_LEN: usize = 48;

const fn default_max_connections() -> u32 {
    10
}

const fn default_min_connections() -> u32 {
    1
}

fn default_vote_table() -> String {
    "votes".to_string()
}

/// Table names end up quoted in generated SQL, but are restricted to plain
/// identifiers so the same name works on every backend.
fn validate_table_name(table: &str) -> Result<(), ValidationError> {
    let mut chars = table.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if starts_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ValidationError::new("table_name"))
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `BALLOT_ENV`)
    /// 4. Environment variables with `BALLOT__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("BALLOT_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BALLOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("BALLOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
