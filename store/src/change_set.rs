//! Staged writes, committed atomically by a [`GovernanceStore`](crate::GovernanceStore).
//!
//! ```ignore
//! let mut changes = ChangeSet::new();
//! changes.put_vote(id, &voter, record);
//! changes.put_tally(id, tally);
//! changes.put_proposal(proposal);
//! store.commit(changes)?;
//! ```

use agora_types::{Address, Proposal, ProposalId, Tally, TokenAmount, VoteRecord};

/// A single staged write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    /// Replace a participant's balance.
    Balance { user: Address, amount: TokenAmount },
    /// Insert or replace a proposal record, keyed by its id.
    Proposal(Proposal),
    /// Insert a vote record. Never replaces an existing one.
    Vote {
        proposal: ProposalId,
        voter: Address,
        record: VoteRecord,
    },
    /// Insert or replace a proposal's tally.
    Tally { proposal: ProposalId, tally: Tally },
    /// Set the proposal counter.
    ProposalCount(u64),
    /// Set the pause flag.
    Paused(bool),
}

/// An ordered list of writes applied all-or-nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_balance(&mut self, user: &Address, amount: TokenAmount) -> &mut Self {
        self.changes.push(Change::Balance {
            user: user.clone(),
            amount,
        });
        self
    }

    pub fn put_proposal(&mut self, proposal: Proposal) -> &mut Self {
        self.changes.push(Change::Proposal(proposal));
        self
    }

    pub fn put_vote(
        &mut self,
        proposal: ProposalId,
        voter: &Address,
        record: VoteRecord,
    ) -> &mut Self {
        self.changes.push(Change::Vote {
            proposal,
            voter: voter.clone(),
            record,
        });
        self
    }

    pub fn put_tally(&mut self, proposal: ProposalId, tally: Tally) -> &mut Self {
        self.changes.push(Change::Tally { proposal, tally });
        self
    }

    pub fn set_proposal_count(&mut self, count: u64) -> &mut Self {
        self.changes.push(Change::ProposalCount(count));
        self
    }

    pub fn set_paused(&mut self, paused: bool) -> &mut Self {
        self.changes.push(Change::Paused(paused));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
