//! agora daemon: entry point for running a governance node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use agora_node::{init_logging, AgoraNode, NodeConfig};
use agora_rpc::{AppState, RpcServer};

#[derive(Parser)]
#[command(name = "agora-daemon", about = "Token-weighted governance node")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "AGORA_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB store.
    #[arg(long, env = "AGORA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Administrator address.
    #[arg(long, env = "AGORA_ADMIN")]
    admin: Option<String>,

    /// RPC server port.
    #[arg(long, env = "AGORA_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Do not start the RPC server.
    #[arg(long, env = "AGORA_DISABLE_RPC")]
    no_rpc: bool,

    /// Serve Prometheus metrics at /metrics.
    #[arg(long, env = "AGORA_ENABLE_METRICS")]
    metrics: bool,

    /// Keep all state in memory (lost on exit).
    #[arg(long, env = "AGORA_MEMORY_STORE")]
    memory: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "AGORA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "AGORA_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the node until SIGINT or SIGTERM.
    Run,
    /// Print the effective configuration as TOML and exit.
    Config,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<NodeConfig> {
        let base = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                NodeConfig::from_toml_file(&path)
                    .with_context(|| format!("loading config file {path}"))?
            }
            None => NodeConfig::default(),
        };

        Ok(NodeConfig {
            data_dir: self.data_dir.clone().unwrap_or(base.data_dir.clone()),
            admin: self.admin.clone().unwrap_or(base.admin.clone()),
            rpc_port: self.rpc_port.unwrap_or(base.rpc_port),
            enable_rpc: base.enable_rpc && !self.no_rpc,
            enable_metrics: self.metrics || base.enable_metrics,
            use_memory_store: self.memory || base.use_memory_store,
            log_level: self.log_level.clone().unwrap_or(base.log_level.clone()),
            log_format: self.log_format.clone().unwrap_or(base.log_format.clone()),
            ..base
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Run => run(config).await,
    }
}

async fn run(config: NodeConfig) -> anyhow::Result<()> {
    init_logging(config.log_format()?, &config.log_level);

    let node = AgoraNode::start(config).context("starting agora node")?;
    tracing::info!(
        admin = %node.handle.admin(),
        rpc = if node.config.enable_rpc {
            node.config.rpc_port.to_string()
        } else {
            "off".into()
        },
        metrics = node.config.enable_metrics,
        "agora node running"
    );

    let rpc_task = if node.config.enable_rpc {
        let state = AppState {
            handle: node.handle.clone(),
            metrics: node
                .config
                .enable_metrics
                .then(|| Arc::clone(&node.metrics)),
        };
        let server = RpcServer::new(node.config.rpc_port, state);
        let shutdown = node.shutdown.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.start(shutdown).await {
                tracing::error!(error = %e, "RPC server failed");
            }
        }))
    } else {
        None
    };

    node.shutdown.wait_for_signal().await;

    if let Some(task) = rpc_task {
        let _ = task.await;
    }
    node.stop().await?;

    tracing::info!("agora daemon exited cleanly");
    Ok(())
}
