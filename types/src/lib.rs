//! Fundamental types for the agora governance engine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! participant addresses, token amounts, block heights, governance parameters,
//! and the proposal / vote / tally records that make up persisted state.

pub mod address;
pub mod amount;
pub mod error;
pub mod params;
pub mod proposal;
pub mod time;
pub mod vote;

pub use address::Address;
pub use amount::TokenAmount;
pub use error::{AddressError, ParamsError};
pub use params::GovernanceParams;
pub use proposal::{Proposal, ProposalId, ProposalState};
pub use time::{BlockHeight, Clock};
pub use vote::{Tally, VoteRecord};
