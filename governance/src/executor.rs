//! Execution capability.
//!
//! The engine gates *when* a proposal may execute and records that it did.
//! Delivering the payload to the target contract is someone else's job,
//! reached through the [`Executor`] trait.

use agora_types::{Address, BlockHeight, ProposalId, TokenAmount};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Notified once per successful execution of a proposal that has a target.
///
/// Fire-and-forget: the engine neither waits on nor inspects the delivery.
pub trait Executor: Send {
    fn notify(&self, target: &Address, action_data: &[u8]);
}

/// Result of a successful execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub proposal_id: ProposalId,
    pub votes_for: TokenAmount,
    pub votes_against: TokenAmount,
    pub total_voters: u64,
    pub total_weight: TokenAmount,
    pub target_contract: Option<Address>,
    pub executed_at: BlockHeight,
}

/// Executor that only records the notification in the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogExecutor;

impl Executor for LogExecutor {
    fn notify(&self, target: &Address, action_data: &[u8]) {
        tracing::info!(
            target_contract = %target,
            payload_len = action_data.len(),
            "execution notification"
        );
    }
}

/// Executor that keeps every notification for later inspection.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<(Address, Vec<u8>)>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far, in order.
    pub fn calls(&self) -> Vec<(Address, Vec<u8>)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Executor for RecordingExecutor {
    fn notify(&self, target: &Address, action_data: &[u8]) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((target.clone(), action_data.to_vec()));
    }
}

impl<E: Executor + Sync> Executor for std::sync::Arc<E> {
    fn notify(&self, target: &Address, action_data: &[u8]) {
        (**self).notify(target, action_data)
    }
}
