//! LMDB implementation of VoteStore.

use agora_store::{StoreError, VoteStore};
use agora_types::{Address, ProposalId, VoteRecord};

use crate::keys::{vote_key, voter_from_key};
use crate::{LmdbError, LmdbGovernanceStore};

impl VoteStore for LmdbGovernanceStore {
    fn get_vote(
        &self,
        proposal: ProposalId,
        voter: &Address,
    ) -> Result<Option<VoteRecord>, StoreError> {
        let env = self.environment();
        let rtxn = env.env().read_txn().map_err(LmdbError::from)?;
        let val = env
            .votes_db
            .get(&rtxn, &vote_key(proposal, voter))
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn votes_for_proposal(
        &self,
        proposal: ProposalId,
    ) -> Result<Vec<(Address, VoteRecord)>, StoreError> {
        let env = self.environment();
        let rtxn = env.env().read_txn().map_err(LmdbError::from)?;
        let prefix = proposal.to_be_bytes();

        let mut votes = Vec::new();
        for item in env
            .votes_db
            .prefix_iter(&rtxn, &prefix[..])
            .map_err(LmdbError::from)?
        {
            let (key, bytes) = item.map_err(LmdbError::from)?;
            let voter = voter_from_key(key)?;
            let record: VoteRecord = bincode::deserialize(bytes).map_err(LmdbError::from)?;
            votes.push((voter, record));
        }
        Ok(votes)
    }
}
