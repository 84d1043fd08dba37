//! Repositories for database access.

pub mod vote;

pub use vote::VoteRepository;
