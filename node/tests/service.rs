//! Integration tests for the governance service:
//! handle → command queue → engine → storage → readback.

use std::sync::Arc;

use agora_governance::{EffectiveStatus, GovernanceError, NewProposal};
use agora_node::{AgoraNode, NodeConfig, NodeError};
use agora_nullables::NullClock;
use agora_types::{Address, BlockHeight, ProposalId, ProposalState, TokenAmount};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn admin() -> Address {
    Address::new("SP0ADMIN")
}

fn memory_config() -> NodeConfig {
    NodeConfig {
        admin: admin().to_string(),
        use_memory_store: true,
        ..NodeConfig::default()
    }
}

fn start(config: NodeConfig) -> (AgoraNode, Arc<NullClock>) {
    let clock = Arc::new(NullClock::new(0));
    let node = AgoraNode::start_with_clock(config, clock.clone()).expect("node starts");
    (node, clock)
}

fn draft(title: &str) -> NewProposal {
    NewProposal {
        title: title.into(),
        description: "integration".into(),
        target_contract: Some(Address::new("SP0TREASURY")),
        action_data: None,
    }
}

fn governance_err(err: NodeError) -> GovernanceError {
    match err {
        NodeError::Governance(e) => e,
        other => panic!("expected a governance error, got {other}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_lifecycle_through_the_handle() {
    let (node, clock) = start(memory_config());
    let h = node.handle.clone();
    let carol = Address::new("carol");

    h.set_balance(admin(), carol.clone(), TokenAmount::new(250_000))
        .await
        .unwrap();
    clock.set(10);
    let id = h.create_proposal(carol.clone(), draft("Spend")).await.unwrap();
    assert_eq!(id, ProposalId::FIRST);

    clock.advance(1);
    let record = h.vote(carol.clone(), id, true).await.unwrap();
    assert_eq!(record.timestamp, BlockHeight::new(11));
    assert_eq!(h.proposal_status(id).await.unwrap(), EffectiveStatus::Active);

    let proposal = h.get_proposal(id).await.unwrap().unwrap();
    clock.set(proposal.execution_time.get());
    assert_eq!(h.proposal_status(id).await.unwrap(), EffectiveStatus::Executable);

    let summary = h.execute_proposal(carol.clone(), id).await.unwrap();
    assert_eq!(summary.total_voters, 1);
    assert_eq!(
        h.get_proposal(id).await.unwrap().unwrap().state,
        ProposalState::Executed
    );

    let metrics = node.metrics.encode().unwrap();
    assert!(metrics.contains("agora_executions_total 1"));
    assert!(metrics.contains("agora_votes_cast_total 1"));

    node.stop().await.unwrap();
}

#[tokio::test]
async fn time_is_stamped_by_the_service() {
    let (node, clock) = start(memory_config());
    clock.set(500);
    assert_eq!(
        node.handle.current_height().await.unwrap(),
        BlockHeight::new(500)
    );

    let alice = Address::new("alice");
    node.handle
        .set_balance(admin(), alice.clone(), TokenAmount::new(1_000))
        .await
        .unwrap();
    let id = node.handle.create_proposal(alice, draft("t")).await.unwrap();
    let proposal = node.handle.get_proposal(id).await.unwrap().unwrap();
    assert_eq!(proposal.created_at, BlockHeight::new(500));
    assert_eq!(proposal.start_time, BlockHeight::new(501));
    node.stop().await.unwrap();
}

#[tokio::test]
async fn concurrent_votes_from_one_voter_count_once() {
    let (node, clock) = start(memory_config());
    let alice = Address::new("alice");
    node.handle
        .set_balance(admin(), alice.clone(), TokenAmount::new(1_000))
        .await
        .unwrap();
    let id = node
        .handle
        .create_proposal(alice.clone(), draft("race"))
        .await
        .unwrap();
    clock.advance(1);

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let h = node.handle.clone();
        let voter = alice.clone();
        tasks.push(tokio::spawn(async move { h.vote(voter, id, true).await }));
    }
    let mut accepted = 0;
    let mut duplicates = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(e) => {
                assert!(matches!(governance_err(e), GovernanceError::AlreadyVoted(_)));
                duplicates += 1;
            }
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(duplicates, 15);

    let tally = node.handle.get_tally(id).await.unwrap().unwrap();
    assert_eq!(tally.total_voters, 1);
    assert_eq!(tally.total_weight, TokenAmount::new(1_000));
    node.stop().await.unwrap();
}

#[tokio::test]
async fn rejections_surface_as_governance_errors() {
    let (node, _clock) = start(memory_config());
    let mallory = Address::new("mallory");

    let err = node
        .handle
        .set_balance(mallory.clone(), mallory.clone(), TokenAmount::new(5))
        .await
        .unwrap_err();
    assert!(matches!(governance_err(err), GovernanceError::NotAuthorized));

    let err = node
        .handle
        .vote(mallory, ProposalId::new(42), true)
        .await
        .unwrap_err();
    assert!(matches!(
        governance_err(err),
        GovernanceError::ProposalNotFound(42)
    ));

    let metrics = node.metrics.encode().unwrap();
    assert!(metrics.contains("code=\"NOT_AUTHORIZED\""));
    node.stop().await.unwrap();
}

#[tokio::test]
async fn pause_round_trip() {
    let (node, _clock) = start(memory_config());
    node.handle.pause(admin()).await.unwrap();
    assert!(node.handle.is_paused().await.unwrap());
    node.handle.unpause(admin()).await.unwrap();
    assert!(!node.handle.is_paused().await.unwrap());
    node.stop().await.unwrap();
}

#[tokio::test]
async fn handle_fails_after_stop() {
    let (node, _clock) = start(memory_config());
    let h = node.handle.clone();
    node.stop().await.unwrap();
    assert!(matches!(
        h.get_proposal_count().await,
        Err(NodeError::ServiceStopped)
    ));
}

#[tokio::test]
async fn lmdb_state_survives_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = NodeConfig {
        admin: admin().to_string(),
        data_dir: dir.path().join("db"),
        ..NodeConfig::default()
    };
    let alice = Address::new("alice");

    let (node, _clock) = start(config.clone());
    node.handle
        .set_balance(admin(), alice.clone(), TokenAmount::new(1_000))
        .await
        .unwrap();
    node.handle
        .create_proposal(alice.clone(), draft("persisted"))
        .await
        .unwrap();
    node.stop().await.unwrap();

    let (node, _clock) = start(config);
    assert_eq!(node.handle.get_proposal_count().await.unwrap(), 1);
    assert_eq!(
        node.handle.get_balance(alice).await.unwrap(),
        TokenAmount::new(1_000)
    );
    node.stop().await.unwrap();
}

#[tokio::test]
async fn invalid_config_is_rejected_before_start() {
    let config = NodeConfig {
        use_memory_store: true,
        ..NodeConfig::default()
    };
    let clock = Arc::new(NullClock::new(0));
    assert!(matches!(
        AgoraNode::start_with_clock(config, clock),
        Err(NodeError::Config(_))
    ));
}
