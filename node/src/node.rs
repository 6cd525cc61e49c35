//! Node assembly: storage, engine, clock and service wired together.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use agora_governance::{GovernanceEngine, LogExecutor};
use agora_nullables::NullStore;
use agora_store_lmdb::{check_data_dir, check_integrity, LmdbGovernanceStore, DEFAULT_MAP_SIZE};
use agora_types::Clock;

use crate::clock::WallClock;
use crate::config::NodeConfig;
use crate::metrics::GovernanceMetrics;
use crate::service::{GovernanceService, NodeHandle};
use crate::shutdown::ShutdownController;
use crate::NodeError;

/// Timeout for the service task to finish after shutdown is signalled.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// A running agora node.
pub struct AgoraNode {
    pub config: NodeConfig,
    pub handle: NodeHandle,
    pub metrics: Arc<GovernanceMetrics>,
    pub shutdown: Arc<ShutdownController>,
    service_task: JoinHandle<()>,
}

impl AgoraNode {
    /// Open storage and start the governance service on the wall clock.
    pub fn start(config: NodeConfig) -> Result<Self, NodeError> {
        let clock: Arc<dyn Clock> = Arc::new(WallClock::new(
            config.genesis_unix_secs,
            config.block_interval_secs,
        ));
        Self::start_with_clock(config, clock)
    }

    /// Like [`start`](Self::start) with an injected clock.
    pub fn start_with_clock(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        config.validate()?;
        let admin = config.admin_address()?;
        let params = config.governance.clone();
        let metrics = Arc::new(GovernanceMetrics::new());
        let shutdown = Arc::new(ShutdownController::new());

        tracing::info!(
            admin = %admin,
            memory = config.use_memory_store,
            data_dir = %config.data_dir.display(),
            voting_period = params.voting_period,
            timelock_period = params.timelock_period,
            quorum = %params.quorum_threshold(),
            "agora node starting"
        );

        let (handle, service_task) = if config.use_memory_store {
            let engine = GovernanceEngine::new(NullStore::new(), LogExecutor, admin, params)?;
            GovernanceService::spawn(engine, clock, Arc::clone(&metrics), shutdown.subscribe())
        } else {
            let store = open_lmdb(&config)?;
            let engine = GovernanceEngine::new(store, LogExecutor, admin, params)?;
            GovernanceService::spawn(engine, clock, Arc::clone(&metrics), shutdown.subscribe())
        };

        Ok(Self {
            config,
            handle,
            metrics,
            shutdown,
            service_task,
        })
    }

    /// Signal shutdown and wait for the service to drain.
    pub async fn stop(self) -> Result<(), NodeError> {
        self.shutdown.shutdown();
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.service_task).await {
            Ok(Ok(())) => {
                tracing::info!("agora node stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "governance service task failed");
                Ok(())
            }
            Err(_) => Err(NodeError::ShutdownTimeout),
        }
    }
}

fn open_lmdb(config: &NodeConfig) -> Result<LmdbGovernanceStore, NodeError> {
    check_data_dir(&config.data_dir).map_err(NodeError::Config)?;
    let store = LmdbGovernanceStore::open(&config.data_dir, DEFAULT_MAP_SIZE)?;

    let report = check_integrity(store.environment())?;
    if report.is_healthy() {
        tracing::info!(
            databases = report.databases_checked,
            entries = report.total_entries,
            "LMDB integrity check passed"
        );
    } else {
        for error in &report.errors {
            tracing::error!(%error, "LMDB integrity problem");
        }
        return Err(NodeError::Config(format!(
            "database at {} failed integrity check ({} problems)",
            config.data_dir.display(),
            report.errors.len()
        )));
    }
    Ok(store)
}
