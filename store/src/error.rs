use agora_types::{Address, ProposalId};
use thiserror::Error;

/// Failure reported by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A change set tried to record a second vote under an existing
    /// `(proposal, voter)` key. Nothing from the set was applied.
    #[error("{voter} already has a vote recorded on proposal {proposal}")]
    DuplicateVote { proposal: ProposalId, voter: Address },

    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("record encoding failed: {0}")]
    Encoding(String),

    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
}
