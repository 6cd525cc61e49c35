//! Proposals and their lifecycle states.

use crate::address::Address;
use crate::amount::TokenAmount;
use crate::time::BlockHeight;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Proposal identifier. Assigned sequentially from 1 and never reused.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProposalId(u64);

impl ProposalId {
    pub const FIRST: Self = Self(1);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// Big-endian bytes, so storage keys sort in id order.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a proposal.
///
/// ```text
/// Pending ──vote──▶ Active ──execute──▶ Succeeded ──▶ Executed
///    │                 │
///    └────execute──────┴──▶ Defeated
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalState {
    /// Created, no votes recorded yet.
    Pending,
    /// At least one vote recorded.
    Active,
    /// Outcome evaluated as passing; execution allowed.
    Succeeded,
    /// Outcome evaluated as failing. Terminal.
    Defeated,
    /// Executed exactly once. Terminal.
    Executed,
}

impl ProposalState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Defeated | Self::Executed)
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    ///
    /// `Active -> Active` is allowed since every vote re-asserts Active.
    pub fn can_transition_to(&self, next: ProposalState) -> bool {
        use ProposalState::*;
        matches!(
            (self, next),
            (Pending, Active)
                | (Active, Active)
                | (Pending, Succeeded)
                | (Active, Succeeded)
                | (Pending, Defeated)
                | (Active, Defeated)
                | (Succeeded, Executed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Succeeded => "succeeded",
            Self::Defeated => "defeated",
            Self::Executed => "executed",
        }
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A governance proposal record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: Address,
    pub title: String,
    pub description: String,
    /// Contract notified on execution, if any.
    pub target_contract: Option<Address>,
    /// Opaque payload handed to the target on execution.
    pub action_data: Option<Vec<u8>>,
    pub votes_for: TokenAmount,
    pub votes_against: TokenAmount,
    /// First height at which votes are accepted (inclusive).
    pub start_time: BlockHeight,
    /// Last height at which votes are accepted (inclusive).
    pub end_time: BlockHeight,
    /// Earliest height at which execution is allowed.
    pub execution_time: BlockHeight,
    pub state: ProposalState,
    pub created_at: BlockHeight,
}

impl Proposal {
    /// Whether `now` lies in `[start_time, end_time]`.
    pub fn is_voting_open(&self, now: BlockHeight) -> bool {
        now >= self.start_time && now <= self.end_time
    }

    /// Whether voting has closed, i.e. `now > end_time`.
    pub fn is_voting_over(&self, now: BlockHeight) -> bool {
        now > self.end_time
    }

    /// Whether the timelock has run out, i.e. `now >= execution_time`.
    pub fn is_timelock_expired(&self, now: BlockHeight) -> bool {
        now >= self.execution_time
    }

    /// `votes_for + votes_against`, saturating.
    pub fn total_votes(&self) -> TokenAmount {
        self.votes_for.saturating_add(self.votes_against)
    }
}
