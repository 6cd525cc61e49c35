//! Proposal storage trait.

use crate::StoreError;
use agora_types::{Proposal, ProposalId};

/// Read access to the proposal table and its counter.
pub trait ProposalStore {
    fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, StoreError>;

    /// Number of proposals ever created; also the highest assigned id.
    fn proposal_count(&self) -> Result<u64, StoreError>;

    /// Up to `limit` proposals in ascending id order, starting after `after`
    /// (or from the first proposal if `None`).
    fn iter_proposals(
        &self,
        after: Option<ProposalId>,
        limit: usize,
    ) -> Result<Vec<Proposal>, StoreError>;
}
