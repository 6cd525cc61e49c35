//! Tally storage trait.

use crate::StoreError;
use agora_types::{ProposalId, Tally};

pub trait TallyStore {
    fn get_tally(&self, proposal: ProposalId) -> Result<Option<Tally>, StoreError>;
}
