//! Votable service: who voted on a record, and how it scores.

use crate::{Votable, Voter};
use ballot_common::{AppResult, EntityKey};
use ballot_db::{entities::VoteSign, repositories::VoteRepository};
use serde::Serialize;

/// Up/down breakdown of the votes on one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    /// Number of up votes.
    pub up: u64,
    /// Number of down votes.
    pub down: u64,
    /// Net score (`up - down`).
    pub score: i64,
}

/// Votable service for the receiving side of voting.
#[derive(Clone)]
pub struct VotableService {
    vote_repo: VoteRepository,
}

impl VotableService {
    /// Create a new votable service.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository) -> Self {
        Self { vote_repo }
    }

    /// Check if `target` has been voted on by `voter`.
    pub async fn is_voted_by(&self, target: &impl Votable, voter: &impl Voter) -> AppResult<bool> {
        Ok(self
            .vote_repo
            .find(&voter.voter_key(), &target.votable_key())
            .await?
            .is_some())
    }

    /// Keys of the voters of `target`, newest vote first.
    pub async fn voters(
        &self,
        target: &impl Votable,
        sign: Option<VoteSign>,
    ) -> AppResult<Vec<EntityKey>> {
        let votes = self
            .vote_repo
            .query_by_target(&target.votable_key(), sign)
            .await?;

        Ok(votes
            .into_iter()
            .map(|v| EntityKey::new(v.voter_type, v.voter_id))
            .collect())
    }

    /// Count the voters of `target`, optionally only those with a given sign.
    pub async fn count_voters(
        &self,
        target: &impl Votable,
        sign: Option<VoteSign>,
    ) -> AppResult<u64> {
        self.vote_repo
            .count_by_target(&target.votable_key(), sign)
            .await
    }

    /// Count the up voters of `target`.
    pub async fn count_up_voters(&self, target: &impl Votable) -> AppResult<u64> {
        self.count_voters(target, Some(VoteSign::Up)).await
    }

    /// Count the down voters of `target`.
    pub async fn count_down_voters(&self, target: &impl Votable) -> AppResult<u64> {
        self.count_voters(target, Some(VoteSign::Down)).await
    }

    /// Sum of the vote signs on `target`, optionally only those with a given
    /// sign.
    pub async fn count_votes_sum(
        &self,
        target: &impl Votable,
        sign: Option<VoteSign>,
    ) -> AppResult<i64> {
        self.vote_repo
            .sum_by_target(&target.votable_key(), sign)
            .await
    }

    /// Net score of `target`: up votes minus down votes.
    ///
    /// This is a signed sum, not the number of votes; use
    /// [`Self::count_voters`] for that.
    pub async fn count_total_votes(&self, target: &impl Votable) -> AppResult<i64> {
        self.count_votes_sum(target, None).await
    }

    /// Up and down counts of `target` together with its net score.
    pub async fn tally(&self, target: &impl Votable) -> AppResult<VoteTally> {
        let up = self.count_up_voters(target).await?;
        let down = self.count_down_voters(target).await?;

        Ok(VoteTally {
            up,
            down,
            score: up as i64 - down as i64,
        })
    }
}
