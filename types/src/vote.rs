//! Vote records and per-proposal tallies.

use crate::amount::TokenAmount;
use crate::time::BlockHeight;
use serde::{Deserialize, Serialize};

/// One participant's vote on one proposal. Written once, never changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub support: bool,
    /// Voter's balance at the time of the vote.
    pub weight: TokenAmount,
    pub timestamp: BlockHeight,
}

/// Running participation totals for a proposal.
///
/// Always equal to the count and weight sum of the proposal's vote records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub total_voters: u64,
    pub total_weight: TokenAmount,
}

impl Tally {
    pub const EMPTY: Self = Self {
        total_voters: 0,
        total_weight: TokenAmount::ZERO,
    };

    /// The tally after one more vote of `weight`, or `None` on overflow.
    pub fn with_vote(&self, weight: TokenAmount) -> Option<Self> {
        Some(Self {
            total_voters: self.total_voters.checked_add(1)?,
            total_weight: self.total_weight.checked_add(weight)?,
        })
    }

    /// Recompute a tally from scratch.
    pub fn from_votes<'a>(votes: impl IntoIterator<Item = &'a VoteRecord>) -> Option<Self> {
        votes
            .into_iter()
            .try_fold(Self::EMPTY, |tally, vote| tally.with_vote(vote.weight))
    }
}
