//! Test utilities for database operations.
//!
//! Provides helpers for setting up and tearing down vote store databases,
//! either a `PostgreSQL` server configured through the environment or any
//! connection URL (e.g. `sqlite::memory:`).

use std::sync::Arc;

use crate::repositories::VoteRepository;
use ballot_common::{AppError, AppResult, VoteConfig};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use tracing::info;

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "ballot_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "ballot_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "ballot_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// Get URL for connecting to postgres database (for creating test DB).
    #[must_use]
    pub fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/postgres",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A migrated vote store for tests.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
    /// Vote table configuration.
    pub votes: VoteConfig,
    /// Name of a database created by [`TestDatabase::create_unique`].
    unique_database: Option<TestDbConfig>,
}

impl TestDatabase {
    /// Connect to the `PostgreSQL` test database from the environment.
    pub async fn new() -> AppResult<Self> {
        Self::connect(&TestDbConfig::default().database_url()).await
    }

    /// Connect to `url` and create the default vote table.
    ///
    /// In-memory `SQLite` databases are limited to a single pooled connection
    /// so every query sees the same database.
    pub async fn connect(url: &str) -> AppResult<Self> {
        Self::connect_with(url, VoteConfig::default()).await
    }

    /// Connect to `url` and create the vote table named by `votes`.
    pub async fn connect_with(url: &str, votes: VoteConfig) -> AppResult<Self> {
        let mut opt = ConnectOptions::new(url);
        if url.contains(":memory:") {
            opt.max_connections(1).min_connections(1);
        }

        let conn = Database::connect(opt)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        crate::migrate(&conn, &votes).await?;

        info!(table = %votes.table, "Connected to test database");

        Ok(Self {
            conn: Arc::new(conn),
            votes,
            unique_database: None,
        })
    }

    /// Create a uniquely named `PostgreSQL` database (for parallel tests).
    pub async fn create_unique() -> AppResult<Self> {
        let mut config = TestDbConfig::default();
        let unique_suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("ballot_test_{}", &unique_suffix[..8]);

        let postgres_conn = Database::connect(&config.postgres_url())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        postgres_conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        postgres_conn
            .close()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut db = Self::connect(&config.database_url()).await?;
        info!(database = %config.database, "Created unique test database");
        db.unique_database = Some(config);
        Ok(db)
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.conn.as_ref()
    }

    /// Vote repository over this database.
    #[must_use]
    pub fn repository(&self) -> VoteRepository {
        VoteRepository::new(self.conn.clone(), &self.votes)
    }

    /// Delete every vote record.
    pub async fn cleanup(&self) -> AppResult<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .execute(Statement::from_string(
                backend,
                format!("DELETE FROM \"{}\"", self.votes.table),
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(table = %self.votes.table, "Cleaned up test database");
        Ok(())
    }

    /// Drop a database created by [`TestDatabase::create_unique`].
    ///
    /// Does nothing for other databases.
    pub async fn drop_database(self) -> AppResult<()> {
        let Some(config) = self.unique_database else {
            return Ok(());
        };
        drop(self.conn);

        let postgres_conn = Database::connect(&config.postgres_url())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Pooled connections from other clones may still be open
        let terminate = format!(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
            config.database
        );
        postgres_conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, terminate))
            .await
            .ok();

        postgres_conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", config.database),
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(database = %config.database, "Dropped test database");
        Ok(())
    }
}
