//! Create vote table migration.

use sea_orm_migration::prelude::*;

/// Creates the vote table under a configurable name.
pub struct Migration {
    table: String,
}

impl Migration {
    /// Migration for a vote table with the given name.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    fn table(&self) -> Alias {
        Alias::new(self.table.as_str())
    }

    fn index_name(&self, suffix: &str) -> String {
        format!("idx_{}_{suffix}", self.table)
    }

    /// Key columns are unbounded: type tags may be full class paths.
    fn table_statement(&self) -> TableCreateStatement {
        Table::create()
            .table(self.table())
            .if_not_exists()
            .col(ColumnDef::new(Vote::VoterType).string().not_null())
            .col(ColumnDef::new(Vote::VoterId).string().not_null())
            .col(ColumnDef::new(Vote::VotableType).string().not_null())
            .col(ColumnDef::new(Vote::VotableId).string().not_null())
            .col(ColumnDef::new(Vote::Sign).integer().not_null())
            .col(
                ColumnDef::new(Vote::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .col(
                ColumnDef::new(Vote::UpdatedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            // One vote per (voter, votable) pair
            .primary_key(
                Index::create()
                    .col(Vote::VoterType)
                    .col(Vote::VoterId)
                    .col(Vote::VotableType)
                    .col(Vote::VotableId),
            )
            .check(Expr::col(Vote::Sign).is_in([1, -1]))
            .to_owned()
    }
}

impl Default for Migration {
    fn default() -> Self {
        Self::new("votes")
    }
}

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250101_000001_create_vote_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(self.table_statement()).await?;

        // Index: (votable_type, votable_id, sign) for counting and summing per target
        manager
            .create_index(
                Index::create()
                    .name(self.index_name("votable"))
                    .table(self.table())
                    .col(Vote::VotableType)
                    .col(Vote::VotableId)
                    .col(Vote::Sign)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for newest-first listings)
        manager
            .create_index(
                Index::create()
                    .name(self.index_name("created_at"))
                    .table(self.table())
                    .col(Vote::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(self.table()).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    VoterType,
    VoterId,
    VotableType,
    VotableId,
    Sign,
    CreatedAt,
    UpdatedAt,
}
