//! End-to-end proposal lifecycle against the in-memory store.

use agora_governance::{
    EffectiveStatus, GovernanceEngine, GovernanceError, NewProposal, RecordingExecutor,
};
use agora_nullables::{NullClock, NullStore};
use agora_types::{
    Address, BlockHeight, Clock, GovernanceParams, ProposalId, ProposalState, Tally, TokenAmount,
    VoteRecord,
};
use proptest::prelude::*;
use std::sync::Arc;

type Engine = GovernanceEngine<NullStore, Arc<RecordingExecutor>>;

struct Harness {
    engine: Engine,
    executor: Arc<RecordingExecutor>,
    clock: NullClock,
    admin: Address,
}

impl Harness {
    fn new() -> Self {
        let admin = Address::new("SP0ADMIN");
        let executor = Arc::new(RecordingExecutor::new());
        let engine = GovernanceEngine::new(
            NullStore::new(),
            executor.clone(),
            admin.clone(),
            GovernanceParams::default(),
        )
        .expect("default params are valid");
        Self {
            engine,
            executor,
            clock: NullClock::new(0),
            admin,
        }
    }

    fn fund(&mut self, name: &str, amount: u64) -> Address {
        let user = Address::new(name);
        self.engine
            .set_balance(&self.admin, &user, TokenAmount::new(amount))
            .expect("admin can set balances");
        user
    }

    fn now(&self) -> BlockHeight {
        self.clock.now()
    }

    fn propose(&mut self, proposer: &Address, title: &str) -> Result<ProposalId, GovernanceError> {
        let now = self.now();
        self.engine.create_proposal(
            proposer,
            now,
            NewProposal {
                title: title.into(),
                description: "Fund the public goods pool".into(),
                target_contract: Some(Address::new("SP0TREASURY")),
                action_data: Some(b"transfer:5000".to_vec()),
            },
        )
    }

    fn vote(
        &mut self,
        voter: &Address,
        id: ProposalId,
        support: bool,
    ) -> Result<VoteRecord, GovernanceError> {
        let now = self.now();
        self.engine.vote(voter, now, id, support)
    }

    fn execute(
        &mut self,
        id: ProposalId,
    ) -> Result<agora_governance::ExecutionSummary, GovernanceError> {
        let now = self.now();
        let caller = Address::new("SP0ANYONE");
        self.engine.execute_proposal(&caller, now, id)
    }
}

#[test]
fn small_holder_proposal_is_defeated_for_lack_of_quorum() {
    let mut h = Harness::new();
    let alice = h.fund("alice", 1_000);
    let bob = Address::new("bob");

    h.clock.set(100);
    let id = h.propose(&alice, "Grant").unwrap();
    assert_eq!(id, ProposalId::FIRST);
    assert_eq!(h.engine.get_proposal_count().unwrap(), 1);

    h.clock.advance(1);
    assert!(matches!(
        h.vote(&bob, id, true),
        Err(GovernanceError::InsufficientTokens { .. })
    ));

    h.vote(&alice, id, true).unwrap();
    let proposal = h.engine.get_proposal(id).unwrap().unwrap();
    assert_eq!(proposal.votes_for, TokenAmount::new(1_000));
    assert_eq!(proposal.state, ProposalState::Active);

    // Between end of voting and end of timelock.
    h.clock.set(proposal.end_time.get() + 1);
    assert!(matches!(
        h.execute(id),
        Err(GovernanceError::TimelockNotExpired { .. })
    ));

    h.clock.set(proposal.execution_time.get());
    assert!(matches!(h.execute(id), Err(GovernanceError::ProposalNotActive)));
    assert_eq!(
        h.engine.get_proposal(id).unwrap().unwrap().state,
        ProposalState::Defeated
    );
    assert!(h.executor.calls().is_empty());
}

#[test]
fn whale_proposal_executes_exactly_once() {
    let mut h = Harness::new();
    let carol = h.fund("carol", 250_000);

    let id = h.propose(&carol, "Treasury spend").unwrap();
    h.clock.advance(1);
    h.vote(&carol, id, true).unwrap();

    let proposal = h.engine.get_proposal(id).unwrap().unwrap();
    h.clock.set(proposal.execution_time.get());
    assert_eq!(
        h.engine.proposal_status(id, h.now()).unwrap(),
        EffectiveStatus::Executable
    );

    let summary = h.execute(id).unwrap();
    assert_eq!(summary.proposal_id, id);
    assert_eq!(summary.votes_for, TokenAmount::new(250_000));
    assert_eq!(summary.total_weight, TokenAmount::new(250_000));
    assert_eq!(
        h.engine.get_proposal(id).unwrap().unwrap().state,
        ProposalState::Executed
    );

    assert!(matches!(h.execute(id), Err(GovernanceError::ProposalNotActive)));
    assert_eq!(
        h.executor.calls(),
        vec![(Address::new("SP0TREASURY"), b"transfer:5000".to_vec())]
    );
}

#[test]
fn second_vote_is_rejected_and_tally_unchanged() {
    let mut h = Harness::new();
    let alice = h.fund("alice", 1_000);
    let id = h.propose(&alice, "Grant").unwrap();
    h.clock.advance(1);
    h.vote(&alice, id, true).unwrap();

    assert!(matches!(
        h.vote(&alice, id, false),
        Err(GovernanceError::AlreadyVoted(_))
    ));
    let proposal = h.engine.get_proposal(id).unwrap().unwrap();
    assert_eq!(proposal.votes_for, TokenAmount::new(1_000));
    assert_eq!(proposal.votes_against, TokenAmount::ZERO);
    assert_eq!(h.engine.get_tally(id).unwrap().unwrap().total_voters, 1);
}

#[test]
fn execute_during_voting_fails() {
    let mut h = Harness::new();
    let carol = h.fund("carol", 250_000);
    let id = h.propose(&carol, "Early").unwrap();
    h.clock.advance(1);
    h.vote(&carol, id, true).unwrap();

    assert!(matches!(h.execute(id), Err(GovernanceError::VotingEnded)));
    let end = h.engine.get_proposal(id).unwrap().unwrap().end_time;
    h.clock.set(end.get());
    assert!(matches!(h.execute(id), Err(GovernanceError::VotingEnded)));
}

#[test]
fn quorum_boundary_decides_outcome() {
    for (weight, expected) in [
        (199_999, ProposalState::Defeated),
        (200_000, ProposalState::Executed),
    ] {
        let mut h = Harness::new();
        let voter = h.fund("voter", weight);
        let proposer = h.fund("proposer", 1_000);
        let id = h.propose(&proposer, "Boundary").unwrap();
        h.clock.advance(1);
        h.vote(&voter, id, true).unwrap();

        let exec = h.engine.get_proposal(id).unwrap().unwrap().execution_time;
        h.clock.set(exec.get());
        let _ = h.execute(id);
        assert_eq!(
            h.engine.get_proposal(id).unwrap().unwrap().state,
            expected,
            "weight {weight}"
        );
    }
}

#[test]
fn against_votes_can_defeat_a_quorate_proposal() {
    let mut h = Harness::new();
    let carol = h.fund("carol", 150_000);
    let dave = h.fund("dave", 150_001);
    let id = h.propose(&carol, "Contested").unwrap();
    h.clock.advance(1);
    h.vote(&carol, id, true).unwrap();
    h.vote(&dave, id, false).unwrap();

    let exec = h.engine.get_proposal(id).unwrap().unwrap().execution_time;
    h.clock.set(exec.get());
    assert_eq!(
        h.engine.proposal_status(id, h.now()).unwrap(),
        EffectiveStatus::Defeated
    );
    assert!(matches!(h.execute(id), Err(GovernanceError::ProposalNotActive)));
}

#[test]
fn non_admin_cannot_touch_the_ledger() {
    let mut h = Harness::new();
    let alice = h.fund("alice", 1_000);
    let err = h
        .engine
        .set_balance(&alice, &Address::new("mallory"), TokenAmount::new(999_999))
        .unwrap_err();
    assert!(matches!(err, GovernanceError::NotAuthorized));
    assert_eq!(
        h.engine.get_balance(&Address::new("mallory")).unwrap(),
        TokenAmount::ZERO
    );
    assert_eq!(h.engine.get_balance(&alice).unwrap(), TokenAmount::new(1_000));
}

#[test]
fn pause_freezes_the_lifecycle() {
    let mut h = Harness::new();
    let carol = h.fund("carol", 250_000);
    let id = h.propose(&carol, "Before pause").unwrap();
    h.clock.advance(1);

    let admin = h.admin.clone();
    h.engine.pause(&admin).unwrap();
    // Idempotent.
    h.engine.pause(&admin).unwrap();

    assert!(matches!(
        h.propose(&carol, "During pause"),
        Err(GovernanceError::NotAuthorized)
    ));
    assert!(matches!(h.vote(&carol, id, true), Err(GovernanceError::NotAuthorized)));
    assert_eq!(h.engine.get_proposal_count().unwrap(), 1);

    h.engine.unpause(&admin).unwrap();
    h.vote(&carol, id, true).unwrap();
}

#[test]
fn idle_proposal_is_defeated_on_execute() {
    let mut h = Harness::new();
    let alice = h.fund("alice", 1_000);
    let id = h.propose(&alice, "Nobody cares").unwrap();

    let exec = h.engine.get_proposal(id).unwrap().unwrap().execution_time;
    h.clock.set(exec.get());
    assert!(matches!(h.execute(id), Err(GovernanceError::ProposalNotActive)));
    assert_eq!(
        h.engine.get_proposal(id).unwrap().unwrap().state,
        ProposalState::Defeated
    );
}

#[test]
fn vote_listing_matches_tally() {
    let mut h = Harness::new();
    let alice = h.fund("alice", 1_000);
    let bob = h.fund("bob", 40);
    let carol = h.fund("carol", 7);
    let id = h.propose(&alice, "Count me").unwrap();
    h.clock.advance(3);
    h.vote(&alice, id, true).unwrap();
    h.vote(&bob, id, false).unwrap();
    h.vote(&carol, id, true).unwrap();

    let votes = h.engine.votes_for_proposal(id).unwrap();
    assert_eq!(votes.len(), 3);
    let derived = Tally::from_votes(votes.iter().map(|(_, v)| v)).unwrap();
    assert_eq!(h.engine.get_tally(id).unwrap(), Some(derived));
    assert!(votes.iter().all(|(_, v)| v.timestamp == BlockHeight::new(3)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn totals_always_match_recorded_votes(
        ballots in prop::collection::vec((1u64..50_000, any::<bool>(), any::<bool>()), 1..20)
    ) {
        let mut h = Harness::new();
        let proposer = h.fund("proposer", 1_000);
        let id = h.propose(&proposer, "Invariant").unwrap();
        h.clock.advance(1);

        for (i, (balance, support, retry)) in ballots.iter().enumerate() {
            let voter = h.fund(&format!("voter{i}"), *balance);
            h.vote(&voter, id, *support).unwrap();
            if *retry {
                let is_dup = matches!(
                    h.vote(&voter, id, !support),
                    Err(GovernanceError::AlreadyVoted(_))
                );
                prop_assert!(is_dup);
            }
        }

        let proposal = h.engine.get_proposal(id).unwrap().unwrap();
        let votes = h.engine.votes_for_proposal(id).unwrap();
        let weight_sum: u64 = votes.iter().map(|(_, v)| v.weight.raw()).sum();
        let for_sum: u64 = votes
            .iter()
            .filter(|(_, v)| v.support)
            .map(|(_, v)| v.weight.raw())
            .sum();

        prop_assert_eq!(proposal.total_votes().raw(), weight_sum);
        prop_assert_eq!(proposal.votes_for.raw(), for_sum);
        prop_assert_eq!(votes.len(), ballots.len());

        let tally = h.engine.get_tally(id).unwrap().unwrap();
        prop_assert_eq!(tally.total_voters, ballots.len() as u64);
        prop_assert_eq!(Some(tally), Tally::from_votes(votes.iter().map(|(_, v)| v)));
    }
}
