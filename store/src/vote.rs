//! Vote ledger storage trait.

use crate::StoreError;
use agora_types::{Address, ProposalId, VoteRecord};

/// Read access to the (proposal, voter) → vote table.
pub trait VoteStore {
    fn get_vote(
        &self,
        proposal: ProposalId,
        voter: &Address,
    ) -> Result<Option<VoteRecord>, StoreError>;

    /// Every vote recorded on `proposal`.
    fn votes_for_proposal(
        &self,
        proposal: ProposalId,
    ) -> Result<Vec<(Address, VoteRecord)>, StoreError>;
}
