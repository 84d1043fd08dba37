//! Common types shared across the ballot crates.
//!
//! - **Configuration**: Database and vote store settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Entity keys**: Polymorphic `(type, id)` identities via [`EntityKey`]
//!
//! # Example
//!
//! ```no_run
//! use ballot_common::{AppResult, Config, EntityKey};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let post = EntityKey::new("post", "42");
//!     println!("votes for {post} live in {}", config.votes.table);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod key;

pub use config::{Config, DatabaseConfig, VoteConfig};
pub use error::{AppError, AppResult};
pub use key::EntityKey;
