//! Write batching: applies a whole [`ChangeSet`] inside one LMDB write
//! transaction.
//!
//! ```ignore
//! let mut batch = WriteBatch::new(&env)?;
//! for change in changes {
//!     batch.apply(change)?;
//! }
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).

use heed::RwTxn;

use agora_store::{Change, StoreError};
use agora_types::{Address, Proposal, ProposalId, Tally, TokenAmount, VoteRecord};

use crate::environment::LmdbEnvironment;
use crate::keys::{vote_key, PAUSED_KEY, PROPOSAL_COUNT_KEY};
use crate::LmdbError;

pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let txn = env.env().write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, env })
    }

    pub fn apply(&mut self, change: Change) -> Result<(), StoreError> {
        match change {
            Change::Balance { user, amount } => self.put_balance(&user, amount),
            Change::Proposal(proposal) => self.put_proposal(&proposal),
            Change::Vote {
                proposal,
                voter,
                record,
            } => self.insert_vote(proposal, &voter, &record),
            Change::Tally { proposal, tally } => self.put_tally(proposal, &tally),
            Change::ProposalCount(count) => self.put_meta(PROPOSAL_COUNT_KEY, &count.to_be_bytes()),
            Change::Paused(paused) => self.put_meta(PAUSED_KEY, &[u8::from(paused)]),
        }
    }

    fn put_balance(&mut self, user: &Address, amount: TokenAmount) -> Result<(), StoreError> {
        self.env
            .balances_db
            .put(&mut self.txn, user.as_bytes(), &amount.raw().to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_proposal(&mut self, proposal: &Proposal) -> Result<(), StoreError> {
        let bytes = bincode::serialize(proposal).map_err(LmdbError::from)?;
        self.env
            .proposals_db
            .put(&mut self.txn, &proposal.id.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Insert a vote; an existing record for the same (proposal, voter) is
    /// never replaced.
    fn insert_vote(
        &mut self,
        proposal: ProposalId,
        voter: &Address,
        record: &VoteRecord,
    ) -> Result<(), StoreError> {
        let key = vote_key(proposal, voter);
        let existing = self
            .env
            .votes_db
            .get(&self.txn, &key)
            .map_err(LmdbError::from)?;
        if existing.is_some() {
            return Err(StoreError::DuplicateVote {
                proposal,
                voter: voter.clone(),
            });
        }

        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        self.env
            .votes_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_tally(&mut self, proposal: ProposalId, tally: &Tally) -> Result<(), StoreError> {
        let bytes = bincode::serialize(tally).map_err(LmdbError::from)?;
        self.env
            .tallies_db
            .put(&mut self.txn, &proposal.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_meta(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.env
            .meta_db
            .put(&mut self.txn, key, value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Commit all batched operations atomically.
    pub fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
