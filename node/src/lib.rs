//! agora node: the serialization layer around the governance engine.
//!
//! The node:
//! - Owns the engine in a single task so operations never interleave
//! - Stamps every operation with the current block height
//! - Persists state in LMDB (or memory for development)
//! - Exposes Prometheus metrics and structured logs

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod service;
pub mod shutdown;

pub use clock::WallClock;
pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::GovernanceMetrics;
pub use node::AgoraNode;
pub use service::{Command, GovernanceService, NodeHandle};
pub use shutdown::ShutdownController;
