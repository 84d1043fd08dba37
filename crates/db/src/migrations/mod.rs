//! Database migrations.
//!
//! Schema migrations for the vote store.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

pub mod m20250101_000001_create_vote_table;

/// Migrator for the default `votes` table.
///
/// Deployments using a custom table name go through [`crate::migrate`]
/// instead, which runs the same migration against the configured name.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(
            m20250101_000001_create_vote_table::Migration::default(),
        )]
    }
}
