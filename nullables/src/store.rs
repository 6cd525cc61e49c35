//! Nullable store: thread-safe in-memory storage for testing.

use agora_store::{
    BalanceStore, Change, ChangeSet, GovernanceStore, MetaStore, ProposalStore, StoreError,
    TallyStore, VoteStore,
};
use agora_types::{Address, Proposal, ProposalId, Tally, TokenAmount, VoteRecord};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone, Default)]
struct Tables {
    balances: HashMap<Address, TokenAmount>,
    proposals: BTreeMap<ProposalId, Proposal>,
    votes: BTreeMap<(ProposalId, Address), VoteRecord>,
    tallies: HashMap<ProposalId, Tally>,
    proposal_count: u64,
    paused: bool,
    schema_version: u32,
}

/// An in-memory governance store.
///
/// All tables sit behind one lock, so a commit is applied atomically with
/// respect to every reader.
pub struct NullStore {
    tables: Mutex<Tables>,
    commits: Mutex<u64>,
    fail_next_commit: Mutex<bool>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            commits: Mutex::new(0),
            fail_next_commit: Mutex::new(false),
        }
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> u64 {
        *self.commits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next [`GovernanceStore::commit`] fail with a backend error
    /// without applying anything.
    pub fn fail_next_commit(&self) {
        *self
            .fail_next_commit
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = true;
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceStore for NullStore {
    fn get_balance(&self, user: &Address) -> Result<Option<TokenAmount>, StoreError> {
        Ok(self.tables().balances.get(user).copied())
    }
}

impl ProposalStore for NullStore {
    fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, StoreError> {
        Ok(self.tables().proposals.get(&id).cloned())
    }

    fn proposal_count(&self) -> Result<u64, StoreError> {
        Ok(self.tables().proposal_count)
    }

    fn iter_proposals(
        &self,
        after: Option<ProposalId>,
        limit: usize,
    ) -> Result<Vec<Proposal>, StoreError> {
        let tables = self.tables();
        let proposals = match after {
            Some(after) => tables
                .proposals
                .range((std::ops::Bound::Excluded(after), std::ops::Bound::Unbounded))
                .take(limit)
                .map(|(_, p)| p.clone())
                .collect(),
            None => tables.proposals.values().take(limit).cloned().collect(),
        };
        Ok(proposals)
    }
}

impl VoteStore for NullStore {
    fn get_vote(
        &self,
        proposal: ProposalId,
        voter: &Address,
    ) -> Result<Option<VoteRecord>, StoreError> {
        Ok(self
            .tables()
            .votes
            .get(&(proposal, voter.clone()))
            .copied())
    }

    fn votes_for_proposal(
        &self,
        proposal: ProposalId,
    ) -> Result<Vec<(Address, VoteRecord)>, StoreError> {
        Ok(self
            .tables()
            .votes
            .iter()
            .filter(|((id, _), _)| *id == proposal)
            .map(|((_, voter), record)| (voter.clone(), *record))
            .collect())
    }
}

impl TallyStore for NullStore {
    fn get_tally(&self, proposal: ProposalId) -> Result<Option<Tally>, StoreError> {
        Ok(self.tables().tallies.get(&proposal).copied())
    }
}

impl MetaStore for NullStore {
    fn is_paused(&self) -> Result<bool, StoreError> {
        Ok(self.tables().paused)
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        Ok(self.tables().schema_version)
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.tables().schema_version = version;
        Ok(())
    }
}

impl GovernanceStore for NullStore {
    fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        {
            let mut fail = self
                .fail_next_commit
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *fail {
                *fail = false;
                return Err(StoreError::Backend("injected commit failure".into()));
            }
        }

        let mut tables = self.tables();
        // Stage on a copy so a rejected change leaves the live tables untouched.
        let mut staged = tables.clone();
        for change in changes {
            match change {
                Change::Balance { user, amount } => {
                    staged.balances.insert(user, amount);
                }
                Change::Proposal(proposal) => {
                    staged.proposals.insert(proposal.id, proposal);
                }
                Change::Vote {
                    proposal,
                    voter,
                    record,
                } => {
                    let key = (proposal, voter);
                    if staged.votes.contains_key(&key) {
                        return Err(StoreError::DuplicateVote {
                            proposal: key.0,
                            voter: key.1,
                        });
                    }
                    staged.votes.insert(key, record);
                }
                Change::Tally { proposal, tally } => {
                    staged.tallies.insert(proposal, tally);
                }
                Change::ProposalCount(count) => staged.proposal_count = count,
                Change::Paused(paused) => staged.paused = paused,
            }
        }
        *tables = staged;
        *self.commits.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::BlockHeight;

    fn vote(weight: u64) -> VoteRecord {
        VoteRecord {
            support: true,
            weight: TokenAmount::new(weight),
            timestamp: BlockHeight::new(1),
        }
    }

    #[test]
    fn unknown_balance_is_none() {
        let store = NullStore::new();
        assert_eq!(store.get_balance(&Address::new("nobody")).unwrap(), None);
    }

    #[test]
    fn commit_applies_all_changes() {
        let store = NullStore::new();
        let alice = Address::new("alice");
        let mut changes = ChangeSet::new();
        changes
            .put_balance(&alice, TokenAmount::new(1_000))
            .set_proposal_count(3)
            .set_paused(true);
        store.commit(changes).unwrap();

        assert_eq!(store.get_balance(&alice).unwrap(), Some(TokenAmount::new(1_000)));
        assert_eq!(store.proposal_count().unwrap(), 3);
        assert!(store.is_paused().unwrap());
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn duplicate_vote_rolls_back_whole_commit() {
        let store = NullStore::new();
        let alice = Address::new("alice");
        let mut first = ChangeSet::new();
        first.put_vote(ProposalId::FIRST, &alice, vote(10));
        store.commit(first).unwrap();

        let mut second = ChangeSet::new();
        second
            .put_balance(&alice, TokenAmount::new(5))
            .put_vote(ProposalId::FIRST, &alice, vote(99));
        let err = store.commit(second).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateVote { .. }));

        assert_eq!(store.get_balance(&alice).unwrap(), None);
        assert_eq!(
            store.get_vote(ProposalId::FIRST, &alice).unwrap(),
            Some(vote(10))
        );
    }

    #[test]
    fn injected_failure_applies_nothing() {
        let store = NullStore::new();
        store.fail_next_commit();
        let mut changes = ChangeSet::new();
        changes.set_paused(true);
        assert!(store.commit(changes).is_err());
        assert!(!store.is_paused().unwrap());
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn votes_for_proposal_filters_by_id() {
        let store = NullStore::new();
        let mut changes = ChangeSet::new();
        changes
            .put_vote(ProposalId::new(1), &Address::new("a"), vote(1))
            .put_vote(ProposalId::new(2), &Address::new("b"), vote(2))
            .put_vote(ProposalId::new(1), &Address::new("c"), vote(3));
        store.commit(changes).unwrap();

        let votes = store.votes_for_proposal(ProposalId::new(1)).unwrap();
        assert_eq!(votes.len(), 2);
        assert!(votes.iter().all(|(voter, _)| voter.as_str() != "b"));
    }
}
