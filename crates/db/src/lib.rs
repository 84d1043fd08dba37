//! Database layer for ballot.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use ballot_common::{AppError, Config, VoteConfig};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::log::LevelFilter;
use validator::Validate;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    config.votes.validate()?;

    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    let db = Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(
        backend = ?db.get_database_backend(),
        table = %config.votes.table,
        "Connected to vote store"
    );

    Ok(db)
}

/// Create the vote table (and its indexes) under the configured name.
///
/// Idempotent: existing tables and indexes are left untouched.
pub async fn migrate(db: &DatabaseConnection, config: &VoteConfig) -> Result<(), AppError> {
    use sea_orm_migration::{MigrationTrait, SchemaManager};

    config.validate()?;

    let manager = SchemaManager::new(db);
    migrations::m20250101_000001_create_vote_table::Migration::new(config.table.as_str())
        .up(&manager)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(table = %config.table, "Vote table ready");
    Ok(())
}
