//! LMDB implementation of ProposalStore.

use std::ops::Bound;

use agora_store::{ProposalStore, StoreError};
use agora_types::{Proposal, ProposalId};

use crate::environment::META_DB;
use crate::keys::{decode_proposal_id, decode_u64, PROPOSAL_COUNT_KEY};
use crate::{LmdbError, LmdbGovernanceStore};

impl ProposalStore for LmdbGovernanceStore {
    fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, StoreError> {
        let env = self.environment();
        let rtxn = env.env().read_txn().map_err(LmdbError::from)?;
        let val = env
            .proposals_db
            .get(&rtxn, &id.to_be_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn proposal_count(&self) -> Result<u64, StoreError> {
        let env = self.environment();
        let rtxn = env.env().read_txn().map_err(LmdbError::from)?;
        let val = env
            .meta_db
            .get(&rtxn, PROPOSAL_COUNT_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(decode_u64(META_DB, bytes)?),
            None => Ok(0),
        }
    }

    fn iter_proposals(
        &self,
        after: Option<ProposalId>,
        limit: usize,
    ) -> Result<Vec<Proposal>, StoreError> {
        let env = self.environment();
        let rtxn = env.env().read_txn().map_err(LmdbError::from)?;

        let after_key = after.map(|id| id.to_be_bytes());
        let lower = match &after_key {
            Some(key) => Bound::Excluded(&key[..]),
            None => Bound::Unbounded,
        };
        let range: (Bound<&[u8]>, Bound<&[u8]>) = (lower, Bound::Unbounded);

        let mut proposals = Vec::with_capacity(limit.min(1_000));
        for item in env
            .proposals_db
            .range(&rtxn, &range)
            .map_err(LmdbError::from)?
            .take(limit)
        {
            let (key, bytes) = item.map_err(LmdbError::from)?;
            let proposal: Proposal = bincode::deserialize(bytes).map_err(LmdbError::from)?;
            if proposal.id != decode_proposal_id(key)? {
                return Err(LmdbError::Corrupt {
                    db: crate::environment::PROPOSALS_DB,
                    reason: format!("record {} stored under another key", proposal.id),
                }
                .into());
            }
            proposals.push(proposal);
        }
        Ok(proposals)
    }
}
