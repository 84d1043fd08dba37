//! Voting logic for ballot.
//!
//! Any record can take part in voting by implementing [`Voter`] (it casts
//! votes) and/or [`Votable`] (it receives votes). The services in
//! [`services`] work on those capabilities rather than on concrete types.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ballot_common::{AppResult, EntityKey, VoteConfig};
//! use ballot_core::{Votable, VotableService, Voter, VoterService};
//! use ballot_db::repositories::VoteRepository;
//! use sea_orm::DatabaseConnection;
//!
//! struct User {
//!     id: i64,
//! }
//!
//! impl Voter for User {
//!     fn voter_key(&self) -> EntityKey {
//!         EntityKey::new("user", self.id.to_string())
//!     }
//! }
//!
//! async fn example(db: Arc<DatabaseConnection>) -> AppResult<()> {
//!     let repo = VoteRepository::new(db, &VoteConfig::default());
//!     let voters = VoterService::new(repo.clone());
//!     let votables = VotableService::new(repo);
//!
//!     let post = EntityKey::new("post", "42");
//!     voters.up_vote(&User { id: 1 }, &post).await?;
//!     assert_eq!(votables.count_total_votes(&post).await?, 1);
//!     Ok(())
//! }
//! ```

pub mod services;

pub use services::*;

use ballot_common::EntityKey;

/// A record that casts votes.
pub trait Voter {
    /// Polymorphic identity of the voter.
    fn voter_key(&self) -> EntityKey;
}

/// A record that receives votes.
pub trait Votable {
    /// Polymorphic identity of the vote target.
    fn votable_key(&self) -> EntityKey;
}

impl Voter for EntityKey {
    fn voter_key(&self) -> EntityKey {
        self.clone()
    }
}

impl Votable for EntityKey {
    fn votable_key(&self) -> EntityKey {
        self.clone()
    }
}

impl<T: Voter + ?Sized> Voter for &T {
    fn voter_key(&self) -> EntityKey {
        (**self).voter_key()
    }
}

impl<T: Votable + ?Sized> Votable for &T {
    fn votable_key(&self) -> EntityKey {
        (**self).votable_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post {
        slug: &'static str,
    }

    impl Votable for Post {
        fn votable_key(&self) -> EntityKey {
            EntityKey::new("post", self.slug)
        }
    }

    #[test]
    fn test_entity_key_is_its_own_identity() {
        let key = EntityKey::new("user", "7");
        assert_eq!(key.voter_key(), key);
        assert_eq!(key.votable_key(), key);
    }

    #[test]
    fn test_references_delegate() {
        let post = Post { slug: "hello" };
        let by_ref: &Post = &post;
        assert_eq!(by_ref.votable_key(), EntityKey::new("post", "hello"));
    }
}
