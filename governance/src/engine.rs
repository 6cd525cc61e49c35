//! Core governance engine: drives proposals through their lifecycle.
//!
//! Mutating operations take `&mut self`, so the borrow checker enforces the
//! one-operation-at-a-time model: whoever owns the engine serializes calls.
//! Each operation validates everything first, stages its writes into one
//! [`ChangeSet`], and commits once. A rejected operation writes nothing, with
//! one exception: an execute attempt that evaluates to Defeated persists the
//! Defeated state before reporting [`GovernanceError::ProposalNotActive`].

use crate::error::GovernanceError;
use crate::executor::{ExecutionSummary, Executor};
use crate::gate::AccessGate;
use crate::outcome::{self, EffectiveStatus, Outcome};
use agora_store::{ChangeSet, GovernanceStore, StoreError};
use agora_types::{
    Address, BlockHeight, GovernanceParams, Proposal, ProposalId, ProposalState, Tally,
    TokenAmount, VoteRecord,
};
use tracing::{debug, info};

/// Caller-supplied fields of a new proposal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewProposal {
    pub title: String,
    pub description: String,
    pub target_contract: Option<Address>,
    pub action_data: Option<Vec<u8>>,
}

pub struct GovernanceEngine<S, E> {
    store: S,
    executor: E,
    gate: AccessGate,
    params: GovernanceParams,
}

impl<S: GovernanceStore, E: Executor> GovernanceEngine<S, E> {
    /// Build an engine over `store`. `admin` is the only identity allowed to
    /// write balances and toggle the pause flag.
    pub fn new(
        store: S,
        executor: E,
        admin: Address,
        params: GovernanceParams,
    ) -> Result<Self, GovernanceError> {
        params.validate()?;
        Ok(Self {
            store,
            executor,
            gate: AccessGate::new(admin),
            params,
        })
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn admin(&self) -> &Address {
        self.gate.admin()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Balance ledger ──────────────────────────────────────────────────

    /// Replace `user`'s balance. Admin only; not affected by the pause flag.
    pub fn set_balance(
        &mut self,
        caller: &Address,
        user: &Address,
        amount: TokenAmount,
    ) -> Result<(), GovernanceError> {
        self.gate.require_admin(caller).inspect_err(|e| {
            debug!(%caller, %user, error = %e, "set_balance rejected");
        })?;

        let mut changes = ChangeSet::new();
        changes.put_balance(user, amount);
        self.store.commit(changes)?;

        info!(%user, %amount, "balance set");
        Ok(())
    }

    /// Balance of `user`; zero if never set.
    pub fn get_balance(&self, user: &Address) -> Result<TokenAmount, GovernanceError> {
        Ok(self.store.get_balance(user)?.unwrap_or(TokenAmount::ZERO))
    }

    // ── Pause gate ──────────────────────────────────────────────────────

    /// Block proposal creation, voting and execution. Admin only.
    pub fn pause(&mut self, caller: &Address) -> Result<(), GovernanceError> {
        self.set_paused(caller, true)
    }

    /// Lift the pause. Admin only.
    pub fn unpause(&mut self, caller: &Address) -> Result<(), GovernanceError> {
        self.set_paused(caller, false)
    }

    pub fn is_paused(&self) -> Result<bool, GovernanceError> {
        Ok(self.store.is_paused()?)
    }

    fn set_paused(&mut self, caller: &Address, paused: bool) -> Result<(), GovernanceError> {
        self.gate.require_admin(caller).inspect_err(|e| {
            debug!(%caller, paused, error = %e, "pause toggle rejected");
        })?;
        if self.store.is_paused()? == paused {
            return Ok(());
        }

        let mut changes = ChangeSet::new();
        changes.set_paused(paused);
        self.store.commit(changes)?;

        info!(paused, "pause flag changed");
        Ok(())
    }

    // ── Proposals ───────────────────────────────────────────────────────

    /// Create a proposal on behalf of `caller` at height `now`.
    ///
    /// Voting opens at `now + 1` and closes `voting_period` blocks later;
    /// execution is allowed `timelock_period` blocks after that.
    pub fn create_proposal(
        &mut self,
        caller: &Address,
        now: BlockHeight,
        draft: NewProposal,
    ) -> Result<ProposalId, GovernanceError> {
        self.try_create_proposal(caller, now, draft).inspect_err(|e| {
            debug!(%caller, %now, error = %e, "create_proposal rejected");
        })
    }

    fn try_create_proposal(
        &mut self,
        caller: &Address,
        now: BlockHeight,
        draft: NewProposal,
    ) -> Result<ProposalId, GovernanceError> {
        self.gate.require_unpaused(&self.store)?;

        let balance = self.get_balance(caller)?;
        let threshold = self.params.min_proposal_threshold;
        if balance < threshold {
            return Err(GovernanceError::InsufficientTokens {
                have: balance.raw(),
                need: threshold.raw(),
            });
        }

        self.check_draft(&draft)?;

        let count = self.store.proposal_count()?;
        let id = ProposalId::new(count.checked_add(1).ok_or(GovernanceError::Overflow)?);
        let start_time = now.checked_add(1).ok_or(GovernanceError::Overflow)?;
        let end_time = start_time
            .checked_add(self.params.voting_period)
            .ok_or(GovernanceError::Overflow)?;
        let execution_time = end_time
            .checked_add(self.params.timelock_period)
            .ok_or(GovernanceError::Overflow)?;

        let proposal = Proposal {
            id,
            proposer: caller.clone(),
            title: draft.title,
            description: draft.description,
            target_contract: draft.target_contract,
            action_data: draft.action_data,
            votes_for: TokenAmount::ZERO,
            votes_against: TokenAmount::ZERO,
            start_time,
            end_time,
            execution_time,
            state: ProposalState::Pending,
            created_at: now,
        };

        let mut changes = ChangeSet::new();
        changes
            .put_proposal(proposal)
            .put_tally(id, Tally::EMPTY)
            .set_proposal_count(id.get());
        self.store.commit(changes)?;

        info!(
            proposal_id = %id,
            proposer = %caller,
            %start_time,
            %end_time,
            %execution_time,
            "proposal created"
        );
        Ok(id)
    }

    fn check_draft(&self, draft: &NewProposal) -> Result<(), GovernanceError> {
        let title_len = draft.title.chars().count();
        if title_len > self.params.max_title_len {
            return Err(GovernanceError::InvalidProposal {
                field: "title",
                len: title_len,
                max: self.params.max_title_len,
            });
        }
        let description_len = draft.description.chars().count();
        if description_len > self.params.max_description_len {
            return Err(GovernanceError::InvalidProposal {
                field: "description",
                len: description_len,
                max: self.params.max_description_len,
            });
        }
        if let Some(data) = &draft.action_data {
            if data.len() > self.params.max_action_data_len {
                return Err(GovernanceError::InvalidProposal {
                    field: "action_data",
                    len: data.len(),
                    max: self.params.max_action_data_len,
                });
            }
        }
        Ok(())
    }

    // ── Voting ──────────────────────────────────────────────────────────

    /// Cast `caller`'s vote on proposal `id`, weighted by their current balance.
    pub fn vote(
        &mut self,
        caller: &Address,
        now: BlockHeight,
        id: ProposalId,
        support: bool,
    ) -> Result<VoteRecord, GovernanceError> {
        self.try_vote(caller, now, id, support).inspect_err(|e| {
            debug!(%caller, %now, proposal_id = %id, error = %e, "vote rejected");
        })
    }

    fn try_vote(
        &mut self,
        caller: &Address,
        now: BlockHeight,
        id: ProposalId,
        support: bool,
    ) -> Result<VoteRecord, GovernanceError> {
        self.gate.require_unpaused(&self.store)?;

        let mut proposal = self.load_proposal(id)?;

        let weight = self.get_balance(caller)?;
        if weight.is_zero() {
            return Err(GovernanceError::InsufficientTokens { have: 0, need: 1 });
        }

        if self.store.get_vote(id, caller)?.is_some() {
            return Err(GovernanceError::AlreadyVoted(caller.to_string()));
        }

        if proposal.state.is_terminal() || !proposal.is_voting_open(now) {
            return Err(GovernanceError::VotingEnded);
        }
        advance_state(&mut proposal, ProposalState::Active)?;

        if support {
            proposal.votes_for = proposal
                .votes_for
                .checked_add(weight)
                .ok_or(GovernanceError::Overflow)?;
        } else {
            proposal.votes_against = proposal
                .votes_against
                .checked_add(weight)
                .ok_or(GovernanceError::Overflow)?;
        }

        let tally = self
            .store
            .get_tally(id)?
            .unwrap_or(Tally::EMPTY)
            .with_vote(weight)
            .ok_or(GovernanceError::Overflow)?;

        let record = VoteRecord {
            support,
            weight,
            timestamp: now,
        };

        let mut changes = ChangeSet::new();
        changes
            .put_vote(id, caller, record)
            .put_tally(id, tally)
            .put_proposal(proposal);
        self.store.commit(changes).map_err(|e| match e {
            StoreError::DuplicateVote { voter, .. } => {
                GovernanceError::AlreadyVoted(voter.to_string())
            }
            other => other.into(),
        })?;

        info!(
            proposal_id = %id,
            voter = %caller,
            support,
            %weight,
            total_voters = tally.total_voters,
            "vote recorded"
        );
        Ok(record)
    }

    // ── Execution ───────────────────────────────────────────────────────

    /// Evaluate and, if it passed, execute proposal `id`.
    ///
    /// Voting must be over and the timelock expired. A passing proposal moves
    /// to Executed and its target (if any) is notified once. A failing one is
    /// marked Defeated and the call returns [`GovernanceError::ProposalNotActive`].
    pub fn execute_proposal(
        &mut self,
        caller: &Address,
        now: BlockHeight,
        id: ProposalId,
    ) -> Result<ExecutionSummary, GovernanceError> {
        self.try_execute(caller, now, id).inspect_err(|e| {
            debug!(%caller, %now, proposal_id = %id, error = %e, "execute rejected");
        })
    }

    fn try_execute(
        &mut self,
        caller: &Address,
        now: BlockHeight,
        id: ProposalId,
    ) -> Result<ExecutionSummary, GovernanceError> {
        self.gate.require_unpaused(&self.store)?;

        let mut proposal = self.load_proposal(id)?;

        if !proposal.is_voting_over(now) {
            return Err(GovernanceError::VotingEnded);
        }
        if !proposal.is_timelock_expired(now) {
            return Err(GovernanceError::TimelockNotExpired {
                execution_time: proposal.execution_time.get(),
            });
        }
        if proposal.state.is_terminal() {
            return Err(GovernanceError::ProposalNotActive);
        }

        let tally = self.store.get_tally(id)?.unwrap_or(Tally::EMPTY);

        let outcome = match proposal.state {
            ProposalState::Succeeded => Outcome::Succeeded,
            _ => outcome::evaluate(&proposal, &tally, &self.params),
        };

        if outcome == Outcome::Defeated {
            advance_state(&mut proposal, ProposalState::Defeated)?;
            let mut changes = ChangeSet::new();
            changes.put_proposal(proposal.clone());
            self.store.commit(changes)?;

            info!(
                proposal_id = %id,
                votes_for = %proposal.votes_for,
                votes_against = %proposal.votes_against,
                total_weight = %tally.total_weight,
                quorum = %self.params.quorum_threshold(),
                "proposal defeated"
            );
            return Err(GovernanceError::ProposalNotActive);
        }

        if proposal.state != ProposalState::Succeeded {
            advance_state(&mut proposal, ProposalState::Succeeded)?;
        }
        advance_state(&mut proposal, ProposalState::Executed)?;
        let mut changes = ChangeSet::new();
        changes.put_proposal(proposal.clone());
        self.store.commit(changes)?;

        if let Some(target) = &proposal.target_contract {
            let payload = proposal.action_data.as_deref().unwrap_or_default();
            self.executor.notify(target, payload);
        }

        info!(proposal_id = %id, executor = %caller, "proposal executed");

        Ok(ExecutionSummary {
            proposal_id: id,
            votes_for: proposal.votes_for,
            votes_against: proposal.votes_against,
            total_voters: tally.total_voters,
            total_weight: tally.total_weight,
            target_contract: proposal.target_contract,
            executed_at: now,
        })
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, GovernanceError> {
        Ok(self.store.get_proposal(id)?)
    }

    pub fn get_user_vote(
        &self,
        user: &Address,
        id: ProposalId,
    ) -> Result<Option<VoteRecord>, GovernanceError> {
        Ok(self.store.get_vote(id, user)?)
    }

    pub fn get_proposal_count(&self) -> Result<u64, GovernanceError> {
        Ok(self.store.proposal_count()?)
    }

    pub fn get_tally(&self, id: ProposalId) -> Result<Option<Tally>, GovernanceError> {
        Ok(self.store.get_tally(id)?)
    }

    /// Up to `limit` proposals with ids greater than `after`, ascending.
    pub fn list_proposals(
        &self,
        after: Option<ProposalId>,
        limit: usize,
    ) -> Result<Vec<Proposal>, GovernanceError> {
        Ok(self.store.iter_proposals(after, limit)?)
    }

    pub fn votes_for_proposal(
        &self,
        id: ProposalId,
    ) -> Result<Vec<(Address, VoteRecord)>, GovernanceError> {
        Ok(self.store.votes_for_proposal(id)?)
    }

    /// The status proposal `id` effectively has at `now`. Never writes.
    pub fn proposal_status(
        &self,
        id: ProposalId,
        now: BlockHeight,
    ) -> Result<EffectiveStatus, GovernanceError> {
        let proposal = self.load_proposal(id)?;
        let tally = self.store.get_tally(id)?.unwrap_or(Tally::EMPTY);
        Ok(outcome::effective_status(&proposal, &tally, &self.params, now))
    }

    fn load_proposal(&self, id: ProposalId) -> Result<Proposal, GovernanceError> {
        self.store
            .get_proposal(id)?
            .ok_or(GovernanceError::ProposalNotFound(id.get()))
    }
}

/// Move `proposal` along an edge of the lifecycle graph, refusing any other move.
fn advance_state(proposal: &mut Proposal, next: ProposalState) -> Result<(), GovernanceError> {
    if !proposal.state.can_transition_to(next) {
        return Err(GovernanceError::ProposalNotActive);
    }
    proposal.state = next;
    Ok(())
}
