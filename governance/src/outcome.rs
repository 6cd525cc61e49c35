//! Outcome evaluation as a pure function of stored totals.
//!
//! Nothing here touches storage. The engine calls [`evaluate`] when execution
//! is attempted; queries call [`effective_status`] to report what a proposal
//! would resolve to without advancing its stored state.

use agora_types::{BlockHeight, GovernanceParams, Proposal, ProposalState, Tally};
use serde::{Deserialize, Serialize};

/// Result of evaluating a proposal once voting is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Defeated,
}

/// Whether participation reached `floor(total_supply * quorum_percentage / 100)`.
pub fn quorum_reached(tally: &Tally, params: &GovernanceParams) -> bool {
    tally.total_weight >= params.quorum_threshold()
}

/// Succeeds iff `votes_for > votes_against` and quorum was reached.
pub fn evaluate(proposal: &Proposal, tally: &Tally, params: &GovernanceParams) -> Outcome {
    if proposal.votes_for > proposal.votes_against && quorum_reached(tally, params) {
        Outcome::Succeeded
    } else {
        Outcome::Defeated
    }
}

/// What a proposal effectively is at height `now`, derived from stored state.
///
/// A proposal whose voting window closed still reads `Pending`/`Active` in
/// storage until someone calls execute; this view reports the outcome it
/// will resolve to instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    /// No votes yet, voting not over.
    Pending,
    /// Votes recorded, voting not over.
    Active,
    /// Would succeed; timelock still running.
    AwaitingTimelock,
    /// Would succeed; can be executed now.
    Executable,
    /// Marked defeated, or would be defeated on execution.
    Defeated,
    Executed,
}

pub fn effective_status(
    proposal: &Proposal,
    tally: &Tally,
    params: &GovernanceParams,
    now: BlockHeight,
) -> EffectiveStatus {
    let passing = || {
        if proposal.is_timelock_expired(now) {
            EffectiveStatus::Executable
        } else {
            EffectiveStatus::AwaitingTimelock
        }
    };

    match proposal.state {
        ProposalState::Executed => EffectiveStatus::Executed,
        ProposalState::Defeated => EffectiveStatus::Defeated,
        ProposalState::Succeeded => passing(),
        ProposalState::Pending | ProposalState::Active if !proposal.is_voting_over(now) => {
            if proposal.state == ProposalState::Pending {
                EffectiveStatus::Pending
            } else {
                EffectiveStatus::Active
            }
        }
        ProposalState::Pending | ProposalState::Active => match evaluate(proposal, tally, params) {
            Outcome::Succeeded => passing(),
            Outcome::Defeated => EffectiveStatus::Defeated,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::{Address, ProposalId, TokenAmount};

    fn proposal(votes_for: u64, votes_against: u64, state: ProposalState) -> Proposal {
        Proposal {
            id: ProposalId::FIRST,
            proposer: Address::new("alice"),
            title: "t".into(),
            description: "d".into(),
            target_contract: None,
            action_data: None,
            votes_for: TokenAmount::new(votes_for),
            votes_against: TokenAmount::new(votes_against),
            start_time: BlockHeight::new(1),
            end_time: BlockHeight::new(1_441),
            execution_time: BlockHeight::new(4_321),
            state,
            created_at: BlockHeight::GENESIS,
        }
    }

    fn tally(voters: u64, weight: u64) -> Tally {
        Tally {
            total_voters: voters,
            total_weight: TokenAmount::new(weight),
        }
    }

    #[test]
    fn quorum_boundary() {
        let params = GovernanceParams::default();
        assert!(!quorum_reached(&tally(1, 199_999), &params));
        assert!(quorum_reached(&tally(1, 200_000), &params));
    }

    #[test]
    fn tie_is_defeated() {
        let params = GovernanceParams::default();
        let p = proposal(150_000, 150_000, ProposalState::Active);
        assert_eq!(evaluate(&p, &tally(2, 300_000), &params), Outcome::Defeated);
    }

    #[test]
    fn majority_without_quorum_is_defeated() {
        let params = GovernanceParams::default();
        let p = proposal(1_000, 0, ProposalState::Active);
        assert_eq!(evaluate(&p, &tally(1, 1_000), &params), Outcome::Defeated);
    }

    #[test]
    fn majority_with_quorum_succeeds() {
        let params = GovernanceParams::default();
        let p = proposal(250_000, 0, ProposalState::Active);
        assert_eq!(evaluate(&p, &tally(1, 250_000), &params), Outcome::Succeeded);
    }

    #[test]
    fn effective_status_tracks_time() {
        let params = GovernanceParams::default();
        let t = tally(1, 250_000);
        let p = proposal(250_000, 0, ProposalState::Active);
        assert_eq!(
            effective_status(&p, &t, &params, BlockHeight::new(100)),
            EffectiveStatus::Active
        );
        assert_eq!(
            effective_status(&p, &t, &params, BlockHeight::new(1_442)),
            EffectiveStatus::AwaitingTimelock
        );
        assert_eq!(
            effective_status(&p, &t, &params, BlockHeight::new(4_321)),
            EffectiveStatus::Executable
        );
    }

    #[test]
    fn idle_proposal_is_effectively_defeated_after_voting() {
        let params = GovernanceParams::default();
        let p = proposal(0, 0, ProposalState::Pending);
        assert_eq!(
            effective_status(&p, &Tally::EMPTY, &params, BlockHeight::new(10)),
            EffectiveStatus::Pending
        );
        assert_eq!(
            effective_status(&p, &Tally::EMPTY, &params, BlockHeight::new(5_000)),
            EffectiveStatus::Defeated
        );
    }
}
