//! LMDB implementation of TallyStore.

use agora_store::{StoreError, TallyStore};
use agora_types::{ProposalId, Tally};

use crate::{LmdbError, LmdbGovernanceStore};

impl TallyStore for LmdbGovernanceStore {
    fn get_tally(&self, proposal: ProposalId) -> Result<Option<Tally>, StoreError> {
        let env = self.environment();
        let rtxn = env.env().read_txn().map_err(LmdbError::from)?;
        let val = env
            .tallies_db
            .get(&rtxn, &proposal.to_be_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }
}
