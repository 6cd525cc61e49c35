//! Governance parameters fixed at deploy time.
//!
//! Periods are measured in blocks. Quorum is expressed as a whole
//! percentage of `total_supply`, the deploy-time constant used for all
//! quorum arithmetic (it is not recomputed from the balance ledger).

use crate::amount::TokenAmount;
use crate::error::ParamsError;
use serde::{Deserialize, Serialize};

/// Blocks a proposal stays open for voting.
pub const VOTING_PERIOD: u64 = 1_440;
/// Blocks between the end of voting and the earliest execution.
pub const TIMELOCK_PERIOD: u64 = 2_880;
/// Balance a participant needs to create a proposal.
pub const MIN_PROPOSAL_THRESHOLD: u64 = 1_000;
/// Share of `total_supply` that must participate.
pub const QUORUM_PERCENTAGE: u8 = 20;
/// Deploy-time total supply used for quorum arithmetic.
pub const TOTAL_SUPPLY: u64 = 1_000_000;
pub const MAX_TITLE_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 256;
pub const MAX_ACTION_DATA_LEN: usize = 1_024;

/// Every tunable of the proposal lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceParams {
    pub voting_period: u64,
    pub timelock_period: u64,
    pub min_proposal_threshold: TokenAmount,
    pub quorum_percentage: u8,
    pub total_supply: TokenAmount,
    /// Title bound, in characters.
    pub max_title_len: usize,
    /// Description bound, in characters.
    pub max_description_len: usize,
    /// Action payload bound, in bytes.
    pub max_action_data_len: usize,
}

impl GovernanceParams {
    /// Reject parameter sets that would make the lifecycle degenerate.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.quorum_percentage > 100 {
            return Err(ParamsError::QuorumOutOfRange(self.quorum_percentage));
        }
        if self.voting_period == 0 {
            return Err(ParamsError::Zero("voting_period"));
        }
        if self.timelock_period == 0 {
            return Err(ParamsError::Zero("timelock_period"));
        }
        if self.total_supply.is_zero() {
            return Err(ParamsError::Zero("total_supply"));
        }
        Ok(())
    }

    /// Minimum participation weight: `floor(total_supply * quorum_percentage / 100)`.
    ///
    /// Computed as `(s / 100) * q + (s % 100) * q / 100`, which equals the
    /// floor above without overflowing for any `u64` supply.
    pub fn quorum_threshold(&self) -> TokenAmount {
        let supply = self.total_supply.raw();
        let q = u64::from(self.quorum_percentage);
        TokenAmount::new((supply / 100) * q + (supply % 100) * q / 100)
    }
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            voting_period: VOTING_PERIOD,
            timelock_period: TIMELOCK_PERIOD,
            min_proposal_threshold: TokenAmount::new(MIN_PROPOSAL_THRESHOLD),
            quorum_percentage: QUORUM_PERCENTAGE,
            total_supply: TokenAmount::new(TOTAL_SUPPLY),
            max_title_len: MAX_TITLE_LEN,
            max_description_len: MAX_DESCRIPTION_LEN,
            max_action_data_len: MAX_ACTION_DATA_LEN,
        }
    }
}
