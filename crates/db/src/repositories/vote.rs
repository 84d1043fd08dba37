//! Vote repository.
//!
//! The only code that touches the vote table. Statements are built with
//! `sea-query` against the configured table name, so one repository type
//! serves every deployment regardless of what the table is called.

use std::sync::Arc;

use crate::entities::{Vote, VoteSign, vote};
use ballot_common::{AppError, AppResult, EntityKey, VoteConfig};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{
    Alias, Cond, Condition, ConditionalStatement, DeleteStatement, Expr, InsertStatement,
    OnConflict, Order, OrderedStatement, Query, SelectStatement,
};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, Iterable,
    Statement, StatementBuilder, TransactionTrait,
};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
    table: String,
}

#[derive(FromQueryResult)]
struct CountResult {
    count: i64,
}

#[derive(FromQueryResult)]
struct SumResult {
    total: Option<i64>,
}

fn db_err(e: DbErr) -> AppError {
    AppError::Database(e.to_string())
}

impl VoteRepository {
    /// Create a new vote repository over the configured table.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &VoteConfig) -> Self {
        Self {
            db,
            table: config.table.clone(),
        }
    }

    /// Name of the table this repository reads and writes.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Find the vote cast by `voter` on `target`.
    pub async fn find(
        &self,
        voter: &EntityKey,
        target: &EntityKey,
    ) -> AppResult<Option<vote::Model>> {
        let mut query = self.select();
        query.cond_where(pair_cond(voter, target));

        Vote::find()
            .from_raw_sql(self.build(&query))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Insert or update the vote of `voter` on `target` in one statement.
    ///
    /// Returns `false` when the stored sign already equals `sign`; the row
    /// (including `updated_at`) is left untouched in that case.
    pub async fn upsert(
        &self,
        voter: &EntityKey,
        target: &EntityKey,
        sign: VoteSign,
    ) -> AppResult<bool> {
        let written = self
            .upsert_with(self.db.as_ref(), voter, target, sign)
            .await?;
        Ok(written > 0)
    }

    /// Upsert the same sign onto several targets inside one transaction.
    ///
    /// Returns the number of rows inserted or changed.
    pub async fn upsert_many(
        &self,
        voter: &EntityKey,
        targets: &[EntityKey],
        sign: VoteSign,
    ) -> AppResult<u64> {
        if targets.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let mut written = 0;
        for target in targets {
            written += self.upsert_with(&txn, voter, target, sign).await?;
        }
        txn.commit().await.map_err(db_err)?;

        Ok(written)
    }

    /// Delete the vote of `voter` on `target`. Returns rows affected (0 or 1).
    pub async fn delete(&self, voter: &EntityKey, target: &EntityKey) -> AppResult<u64> {
        let stmt = self.delete_statement(pair_cond(voter, target));
        let rows = self.execute(&stmt).await?;

        tracing::debug!(voter = %voter, target = %target, rows, "Deleted vote");
        Ok(rows)
    }

    /// Delete the votes of `voter` on all `targets` in one statement.
    pub async fn delete_many(&self, voter: &EntityKey, targets: &[EntityKey]) -> AppResult<u64> {
        if targets.is_empty() {
            return Ok(0);
        }

        let any_target = targets
            .iter()
            .fold(Cond::any(), |cond, target| cond.add(target_cond(target)));
        let stmt = self.delete_statement(voter_cond(voter).add(any_target));
        let rows = self.execute(&stmt).await?;

        tracing::debug!(voter = %voter, targets = targets.len(), rows, "Deleted votes");
        Ok(rows)
    }

    /// Votes received by `target`, newest first.
    pub async fn query_by_target(
        &self,
        target: &EntityKey,
        sign: Option<VoteSign>,
    ) -> AppResult<Vec<vote::Model>> {
        let mut query = self.select();
        query
            .cond_where(with_sign(target_cond(target), sign))
            .order_by(vote::Column::CreatedAt, Order::Desc);

        Vote::find()
            .from_raw_sql(self.build(&query))
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Votes cast by `voter`, newest first, optionally limited to one
    /// target type.
    pub async fn query_by_voter(
        &self,
        voter: &EntityKey,
        votable_type: Option<&str>,
        sign: Option<VoteSign>,
    ) -> AppResult<Vec<vote::Model>> {
        let cond = voter_cond(voter)
            .add_option(votable_type.map(|t| Expr::col(vote::Column::VotableType).eq(t)));

        let mut query = self.select();
        query
            .cond_where(with_sign(cond, sign))
            .order_by(vote::Column::CreatedAt, Order::Desc);

        Vote::find()
            .from_raw_sql(self.build(&query))
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Number of votes (one per voter) received by `target`.
    pub async fn count_by_target(
        &self,
        target: &EntityKey,
        sign: Option<VoteSign>,
    ) -> AppResult<u64> {
        let mut query = Query::select();
        query
            .expr_as(Expr::col(vote::Column::VoterId).count(), Alias::new("count"))
            .from(self.table())
            .cond_where(with_sign(target_cond(target), sign));

        let result = CountResult::find_by_statement(self.build(&query))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(result.map_or(0, |r| u64::try_from(r.count).unwrap_or(0)))
    }

    /// Sum of the signs of the votes received by `target`.
    pub async fn sum_by_target(
        &self,
        target: &EntityKey,
        sign: Option<VoteSign>,
    ) -> AppResult<i64> {
        let mut query = Query::select();
        query
            .expr_as(Expr::col(vote::Column::Sign).sum(), Alias::new("total"))
            .from(self.table())
            .cond_where(with_sign(target_cond(target), sign));

        let result = SumResult::find_by_statement(self.build(&query))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(result.and_then(|r| r.total).unwrap_or(0))
    }

    async fn upsert_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        voter: &EntityKey,
        target: &EntityKey,
        sign: VoteSign,
    ) -> AppResult<u64> {
        let stmt = self.upsert_statement(voter, target, sign)?;
        let rows = conn
            .execute(conn.get_database_backend().build(&stmt))
            .await
            .map_err(db_err)?
            .rows_affected();

        tracing::debug!(
            voter = %voter,
            target = %target,
            sign = sign.value(),
            rows,
            "Upserted vote"
        );
        Ok(rows)
    }

    fn upsert_statement(
        &self,
        voter: &EntityKey,
        target: &EntityKey,
        sign: VoteSign,
    ) -> AppResult<InsertStatement> {
        let now: DateTimeWithTimeZone = Utc::now().into();

        let mut insert = Query::insert();
        insert
            .into_table(self.table())
            .columns(vote::Column::iter())
            .values([
                voter.entity_type.as_str().into(),
                voter.id.as_str().into(),
                target.entity_type.as_str().into(),
                target.id.as_str().into(),
                sign.value().into(),
                now.into(),
                now.into(),
            ])
            .map_err(|e| AppError::Internal(e.to_string()))?
            .on_conflict(
                OnConflict::columns([
                    vote::Column::VoterType,
                    vote::Column::VoterId,
                    vote::Column::VotableType,
                    vote::Column::VotableId,
                ])
                .update_columns([vote::Column::Sign, vote::Column::UpdatedAt])
                // Same sign again: leave the row (and updated_at) alone
                .action_and_where(
                    Expr::col((self.table(), vote::Column::Sign)).ne(sign.value()),
                )
                .to_owned(),
            );

        Ok(insert)
    }

    fn delete_statement(&self, cond: Condition) -> DeleteStatement {
        Query::delete()
            .from_table(self.table())
            .cond_where(cond)
            .to_owned()
    }

    fn select(&self) -> SelectStatement {
        Query::select()
            .columns(vote::Column::iter())
            .from(self.table())
            .to_owned()
    }

    async fn execute<S: StatementBuilder>(&self, stmt: &S) -> AppResult<u64> {
        self.db
            .execute(self.build(stmt))
            .await
            .map(|r| r.rows_affected())
            .map_err(db_err)
    }

    fn build<S: StatementBuilder>(&self, stmt: &S) -> Statement {
        self.db.get_database_backend().build(stmt)
    }

    fn table(&self) -> Alias {
        Alias::new(self.table.as_str())
    }
}

fn voter_cond(voter: &EntityKey) -> Condition {
    Cond::all()
        .add(Expr::col(vote::Column::VoterType).eq(voter.entity_type.as_str()))
        .add(Expr::col(vote::Column::VoterId).eq(voter.id.as_str()))
}

fn target_cond(target: &EntityKey) -> Condition {
    Cond::all()
        .add(Expr::col(vote::Column::VotableType).eq(target.entity_type.as_str()))
        .add(Expr::col(vote::Column::VotableId).eq(target.id.as_str()))
}

fn pair_cond(voter: &EntityKey, target: &EntityKey) -> Condition {
    voter_cond(voter).add(target_cond(target))
}

fn with_sign(cond: Condition, sign: Option<VoteSign>) -> Condition {
    cond.add_option(sign.map(|s| Expr::col(vote::Column::Sign).eq(s.value())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{PostgresQueryBuilder, QueryStatementWriter, SqliteQueryBuilder};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn create_test_vote(voter_id: &str, post_id: &str, sign: VoteSign) -> vote::Model {
        vote::Model {
            voter_type: "user".to_string(),
            voter_id: voter_id.to_string(),
            votable_type: "post".to_string(),
            votable_id: post_id.to_string(),
            sign,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn user(id: &str) -> EntityKey {
        EntityKey::new("user", id)
    }

    fn post(id: &str) -> EntityKey {
        EntityKey::new("post", id)
    }

    fn repo(db: DatabaseConnection) -> VoteRepository {
        VoteRepository::new(Arc::new(db), &VoteConfig::default())
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_find_found() {
        let vote = create_test_vote("user1", "post1", VoteSign::Down);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[vote.clone()]])
            .into_connection();

        let result = repo(db).find(&user("user1"), &post("post1")).await.unwrap();

        assert_eq!(result, Some(vote));
    }

    #[tokio::test]
    async fn test_find_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<vote::Model>::new()])
            .into_connection();

        let result = repo(db).find(&user("user1"), &post("post1")).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_upsert_written() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1)])
            .into_connection();

        let written = repo(db)
            .upsert(&user("user1"), &post("post1"), VoteSign::Up)
            .await
            .unwrap();

        assert!(written);
    }

    #[tokio::test]
    async fn test_upsert_same_sign_is_noop() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .into_connection();

        let written = repo(db)
            .upsert(&user("user1"), &post("post1"), VoteSign::Up)
            .await
            .unwrap();

        assert!(!written);
    }

    #[tokio::test]
    async fn test_upsert_many_counts_written_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1), exec(0), exec(1)])
            .into_connection();

        let written = repo(db)
            .upsert_many(
                &user("user1"),
                &[post("post1"), post("post2"), post("post3")],
                VoteSign::Down,
            )
            .await
            .unwrap();

        assert_eq!(written, 2);
    }

    #[tokio::test]
    async fn test_upsert_many_empty() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let written = repo(db)
            .upsert_many(&user("user1"), &[], VoteSign::Up)
            .await
            .unwrap();

        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_an_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .into_connection();

        let rows = repo(db).delete(&user("user1"), &post("post1")).await.unwrap();

        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_query_by_target() {
        let v1 = create_test_vote("user1", "post1", VoteSign::Up);
        let v2 = create_test_vote("user2", "post1", VoteSign::Down);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[v1, v2]])
            .into_connection();

        let result = repo(db).query_by_target(&post("post1"), None).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[1].voter_id, "user2");
    }

    #[tokio::test]
    async fn test_count_by_target() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "count" => Into::<Value>::into(3i64),
            }]])
            .into_connection();

        let count = repo(db)
            .count_by_target(&post("post1"), Some(VoteSign::Up))
            .await
            .unwrap();

        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_sum_by_target_without_votes() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "total" => Value::BigInt(None),
            }]])
            .into_connection();

        let sum = repo(db).sum_by_target(&post("post1"), None).await.unwrap();

        assert_eq!(sum, 0);
    }

    #[tokio::test]
    async fn test_database_error_is_propagated() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();

        let err = repo(db)
            .upsert(&user("user1"), &post("post1"), VoteSign::Up)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_upsert_statement_is_conditional() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let stmt = repo(db)
            .upsert_statement(&user("user1"), &post("post1"), VoteSign::Down)
            .unwrap();

        let sql = stmt.to_string(PostgresQueryBuilder);
        assert!(sql.starts_with(r#"INSERT INTO "votes""#));
        assert!(sql.contains("ON CONFLICT"));
        assert!(sql.contains("DO UPDATE"));
        assert!(sql.contains(r#""votes"."sign" <> -1"#));
    }

    #[test]
    fn test_statements_use_configured_table() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let repo = VoteRepository::new(Arc::new(db), &VoteConfig::with_table("post_votes"));

        let delete = repo.delete_statement(pair_cond(&user("user1"), &post("post1")));
        let sql = delete.to_string(SqliteQueryBuilder);

        assert!(sql.starts_with(r#"DELETE FROM "post_votes""#));
        assert_eq!(repo.table_name(), "post_votes");
    }
}
