//! Abstract storage traits for the agora governance engine.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The engine depends only on the traits.
//!
//! Reads go through the per-table traits. Writes are never issued one by one:
//! the engine stages them into a [`ChangeSet`] and hands the whole set to
//! [`GovernanceStore::commit`], which applies it all-or-nothing.

pub mod balance;
pub mod change_set;
pub mod error;
pub mod meta;
pub mod proposal;
pub mod tally;
pub mod vote;

pub use balance::BalanceStore;
pub use change_set::{Change, ChangeSet};
pub use error::StoreError;
pub use meta::MetaStore;
pub use proposal::ProposalStore;
pub use tally::TallyStore;
pub use vote::VoteStore;

/// Everything the governance engine needs from a backend.
pub trait GovernanceStore:
    BalanceStore + ProposalStore + VoteStore + TallyStore + MetaStore
{
    /// Apply every change in `changes` atomically.
    ///
    /// Either all changes become visible or none do. A [`Change::Vote`] for a
    /// (proposal, voter) pair that already has a record fails the whole commit
    /// with [`StoreError::DuplicateVote`].
    fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;
}
