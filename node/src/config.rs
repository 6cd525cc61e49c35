//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use agora_types::{Address, GovernanceParams};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for an agora node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Identity allowed to write balances and toggle the pause flag.
    #[serde(default)]
    pub admin: String,

    /// Whether to enable the RPC server.
    #[serde(default = "default_true")]
    pub enable_rpc: bool,

    /// RPC port (if enabled).
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds per block of the wall clock.
    #[serde(default = "default_block_interval")]
    pub block_interval_secs: u64,

    /// Unix time of block 0.
    #[serde(default)]
    pub genesis_unix_secs: u64,

    /// Whether to expose Prometheus metrics at `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Keep all state in memory instead of LMDB. Nothing survives a restart.
    #[serde(default)]
    pub use_memory_store: bool,

    /// Fixed deploy-time governance parameters.
    #[serde(default)]
    pub governance: GovernanceParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./agora_data")
}

fn default_true() -> bool {
    true
}

fn default_rpc_port() -> u16 {
    7180
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_block_interval() -> u64 {
    600
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// The configured admin identity.
    pub fn admin_address(&self) -> Result<Address, NodeError> {
        if self.admin.is_empty() {
            return Err(NodeError::Config("admin identity is not set".into()));
        }
        Address::parse(self.admin.as_str())
            .map_err(|e| NodeError::Config(format!("invalid admin identity: {e}")))
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    /// Check everything that can be checked before the node starts.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.admin_address()?;
        self.log_format()?;
        if self.block_interval_secs == 0 {
            return Err(NodeError::Config("block_interval_secs must be non-zero".into()));
        }
        self.governance
            .validate()
            .map_err(|e| NodeError::Config(format!("invalid governance parameters: {e}")))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            admin: String::new(),
            enable_rpc: default_true(),
            rpc_port: default_rpc_port(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            block_interval_secs: default_block_interval(),
            genesis_unix_secs: 0,
            enable_metrics: false,
            use_memory_store: false,
            governance: GovernanceParams::default(),
        }
    }
}
