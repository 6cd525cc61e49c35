//! Prometheus metrics for governance activity.
//!
//! [`GovernanceMetrics`] owns a dedicated [`Registry`] that the RPC
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

use crate::NodeError;

pub struct GovernanceMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    pub proposals_created: IntCounter,
    pub votes_cast: IntCounter,
    /// Proposals that reached Executed.
    pub executions: IntCounter,
    /// Proposals marked Defeated by an execute attempt.
    pub defeats: IntCounter,
    /// Operations rejected by the engine, labelled by error code.
    pub rejected_operations: IntCounterVec,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub proposal_count: IntGauge,
    pub paused: IntGauge,
}

impl GovernanceMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let proposals_created = register_int_counter_with_registry!(
            Opts::new("agora_proposals_created_total", "Total proposals created"),
            registry
        )
        .expect("failed to register proposals_created counter");

        let votes_cast = register_int_counter_with_registry!(
            Opts::new("agora_votes_cast_total", "Total votes recorded"),
            registry
        )
        .expect("failed to register votes_cast counter");

        let executions = register_int_counter_with_registry!(
            Opts::new("agora_executions_total", "Total proposals executed"),
            registry
        )
        .expect("failed to register executions counter");

        let defeats = register_int_counter_with_registry!(
            Opts::new("agora_defeats_total", "Total proposals defeated on execution"),
            registry
        )
        .expect("failed to register defeats counter");

        let rejected_operations = register_int_counter_vec_with_registry!(
            Opts::new(
                "agora_rejected_operations_total",
                "Operations rejected by the governance engine"
            ),
            &["code"],
            registry
        )
        .expect("failed to register rejected_operations counter");

        let proposal_count = register_int_gauge_with_registry!(
            Opts::new("agora_proposal_count", "Number of proposals ever created"),
            registry
        )
        .expect("failed to register proposal_count gauge");

        let paused = register_int_gauge_with_registry!(
            Opts::new("agora_paused", "1 while governance is paused"),
            registry
        )
        .expect("failed to register paused gauge");

        Self {
            registry,
            proposals_created,
            votes_cast,
            executions,
            defeats,
            rejected_operations,
            proposal_count,
            paused,
        }
    }

    /// Encode every metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| NodeError::Config(e.to_string()))
    }
}

impl Default for GovernanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}
