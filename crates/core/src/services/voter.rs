//! Voter service: casting, changing and cancelling votes.

use crate::{Votable, Voter};
use ballot_common::{AppResult, EntityKey};
use ballot_db::{
    entities::{VoteSign, vote},
    repositories::VoteRepository,
};

/// Voter service for the casting side of voting.
#[derive(Clone)]
pub struct VoterService {
    vote_repo: VoteRepository,
}

impl VoterService {
    /// Create a new voter service.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository) -> Self {
        Self { vote_repo }
    }

    /// Vote on `target` with a raw sign (`1` or `-1`).
    ///
    /// Any other sign is rejected with a validation error before touching
    /// storage. Returns whether a record was inserted or changed.
    pub async fn vote(
        &self,
        voter: &impl Voter,
        target: &impl Votable,
        sign: i32,
    ) -> AppResult<bool> {
        let sign = VoteSign::try_from(sign)?;
        self.cast(voter, target, sign).await
    }

    /// Vote on `target` with the given sign.
    ///
    /// Casting the sign that is already stored is a no-op and returns `false`.
    pub async fn cast(
        &self,
        voter: &impl Voter,
        target: &impl Votable,
        sign: VoteSign,
    ) -> AppResult<bool> {
        self.vote_repo
            .upsert(&voter.voter_key(), &target.votable_key(), sign)
            .await
    }

    /// Up vote `target`.
    pub async fn up_vote(&self, voter: &impl Voter, target: &impl Votable) -> AppResult<bool> {
        self.cast(voter, target, VoteSign::Up).await
    }

    /// Down vote `target`.
    pub async fn down_vote(&self, voter: &impl Voter, target: &impl Votable) -> AppResult<bool> {
        self.cast(voter, target, VoteSign::Down).await
    }

    /// Vote on several targets at once, atomically.
    ///
    /// Returns the number of records inserted or changed.
    pub async fn vote_many<T: Votable>(
        &self,
        voter: &impl Voter,
        targets: &[T],
        sign: VoteSign,
    ) -> AppResult<u64> {
        let keys = target_keys(targets);
        self.vote_repo
            .upsert_many(&voter.voter_key(), &keys, sign)
            .await
    }

    /// Cancel the vote on `target`. Returns rows affected (0 when there was
    /// no vote).
    pub async fn cancel_vote(&self, voter: &impl Voter, target: &impl Votable) -> AppResult<u64> {
        self.vote_repo
            .delete(&voter.voter_key(), &target.votable_key())
            .await
    }

    /// Cancel the votes on several targets at once.
    pub async fn cancel_many<T: Votable>(
        &self,
        voter: &impl Voter,
        targets: &[T],
    ) -> AppResult<u64> {
        let keys = target_keys(targets);
        self.vote_repo.delete_many(&voter.voter_key(), &keys).await
    }

    /// Check if `voter` has voted on `target`, optionally with a given sign.
    pub async fn has_voted(
        &self,
        voter: &impl Voter,
        target: &impl Votable,
        sign: Option<VoteSign>,
    ) -> AppResult<bool> {
        let stored = self.get_vote(voter, target).await?;
        Ok(match sign {
            Some(sign) => stored == Some(sign),
            None => stored.is_some(),
        })
    }

    /// Check if `voter` has up voted `target`.
    pub async fn has_up_voted(&self, voter: &impl Voter, target: &impl Votable) -> AppResult<bool> {
        self.has_voted(voter, target, Some(VoteSign::Up)).await
    }

    /// Check if `voter` has down voted `target`.
    pub async fn has_down_voted(
        &self,
        voter: &impl Voter,
        target: &impl Votable,
    ) -> AppResult<bool> {
        self.has_voted(voter, target, Some(VoteSign::Down)).await
    }

    /// The sign `voter` stored on `target`, if any.
    pub async fn get_vote(
        &self,
        voter: &impl Voter,
        target: &impl Votable,
    ) -> AppResult<Option<VoteSign>> {
        Ok(self
            .vote_repo
            .find(&voter.voter_key(), &target.votable_key())
            .await?
            .map(|v| v.sign))
    }

    /// Votes cast by `voter`, newest first.
    ///
    /// `votable_type` restricts the result to one kind of target.
    pub async fn voted_items(
        &self,
        voter: &impl Voter,
        votable_type: Option<&str>,
        sign: Option<VoteSign>,
    ) -> AppResult<Vec<vote::Model>> {
        self.vote_repo
            .query_by_voter(&voter.voter_key(), votable_type, sign)
            .await
    }
}

fn target_keys<T: Votable>(targets: &[T]) -> Vec<EntityKey> {
    targets.iter().map(|t| t.votable_key()).collect()
}
