//! Token-weighted governance for agora.
//!
//! Lifecycle: Pending → Active (first vote) → Succeeded | Defeated → Executed.
//!
//! Key principles:
//! - Voting weight is the voter's ledger balance, snapshotted when the vote is cast.
//! - Outcome is evaluated lazily when execution is attempted, never by a scheduler.
//! - Every operation takes the caller and the current block height explicitly and
//!   commits its writes as one atomic change set, or none at all.

pub mod engine;
pub mod error;
pub mod executor;
pub mod gate;
pub mod outcome;

pub use engine::{GovernanceEngine, NewProposal};
pub use error::GovernanceError;
pub use executor::{ExecutionSummary, Executor, LogExecutor, RecordingExecutor};
pub use gate::AccessGate;
pub use outcome::{EffectiveStatus, Outcome};
