//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `ballot_test`)
//!   `TEST_DB_PASSWORD` (default: `ballot_test`)
//!   `TEST_DB_NAME` (default: `ballot_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use ballot_common::EntityKey;
use ballot_db::entities::VoteSign;
use ballot_db::test_utils::{TestDatabase, TestDbConfig};

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let result = TestDatabase::new().await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_upsert_roundtrip_on_postgres() {
    let db = TestDatabase::create_unique()
        .await
        .expect("Failed to create database");
    let repo = db.repository();
    let voter = EntityKey::new("user", "a");
    let post = EntityKey::new("post", "p");

    assert!(repo.upsert(&voter, &post, VoteSign::Up).await.unwrap());
    assert!(!repo.upsert(&voter, &post, VoteSign::Up).await.unwrap());
    assert!(repo.upsert(&voter, &post, VoteSign::Down).await.unwrap());
    assert_eq!(repo.sum_by_target(&post, None).await.unwrap(), -1);
    assert_eq!(repo.count_by_target(&post, None).await.unwrap(), 1);

    db.drop_database().await.expect("Failed to drop database");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_long_keys_on_postgres() {
    let db = TestDatabase::create_unique()
        .await
        .expect("Failed to create database");
    let repo = db.repository();
    let voter = EntityKey::new("user", "x".repeat(65));
    let post = EntityKey::new("App\\Models\\".repeat(10), "p");

    assert!(repo.upsert(&voter, &post, VoteSign::Up).await.unwrap());
    assert!(repo.find(&voter, &post).await.unwrap().is_some());

    db.drop_database().await.expect("Failed to drop database");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_upserts_on_postgres() {
    let db = TestDatabase::create_unique()
        .await
        .expect("Failed to create database");
    let repo = db.repository();

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                let sign = if i % 3 == 0 { VoteSign::Down } else { VoteSign::Up };
                repo.upsert(&EntityKey::new("user", "a"), &EntityKey::new("post", "p"), sign)
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let count = repo
        .count_by_target(&EntityKey::new("post", "p"), None)
        .await
        .unwrap();
    assert_eq!(count, 1);

    db.drop_database().await.expect("Failed to drop database");
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testdb"));
}
