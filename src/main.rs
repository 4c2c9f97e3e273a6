use clap::Parser;
use sharded_kv::config::{ClusterConfig, DEFAULT_BIND_ADDR, DEFAULT_DATA_DIR, DEFAULT_VIRTUAL_REPLICAS};
use sharded_kv::coordinator::{AckMode, Coordinator};
use sharded_kv::nodes::{EngineKind, EngineOptions, NodeManager};
use sharded_kv::ring::{HashRing, NodeId};
use sharded_kv::server::{ServerState, router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "sharded-kv")]
#[command(about = "Sharded, replicated key-value store over embedded per-node engines")]
struct Args {
    /// Comma-separated node ids hosted by this process
    #[arg(long, env = "SHARDED_KV_NODES", value_delimiter = ',', default_value = "node1,node2,node3,node4,node5")]
    nodes: Vec<String>,

    /// Directory holding one engine directory per node
    #[arg(long, env = "SHARDED_KV_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Ring positions per node
    #[arg(long, env = "SHARDED_KV_VIRTUAL_REPLICAS", default_value_t = DEFAULT_VIRTUAL_REPLICAS)]
    virtual_replicas: usize,

    /// Distinct nodes holding each record
    #[arg(long, env = "SHARDED_KV_REPLICATION_FACTOR", default_value_t = sharded_kv::ring::REPLICATION_FACTOR)]
    replication_factor: usize,

    #[arg(long, env = "SHARDED_KV_BIND", default_value = DEFAULT_BIND_ADDR)]
    bind: SocketAddr,

    /// Per-request deadline in seconds
    #[arg(long, env = "SHARDED_KV_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    #[arg(long, env = "SHARDED_KV_ENGINE", value_enum, default_value_t = EngineKind::Rocksdb)]
    engine: EngineKind,

    /// When a put counts as successful
    #[arg(long, env = "SHARDED_KV_ACK_MODE", value_enum, default_value_t = AckMode::BestEffort)]
    ack_mode: AckMode,

    /// fsync every write before acknowledging it
    #[arg(long, env = "SHARDED_KV_SYNC_WRITES")]
    sync_writes: bool,

    #[arg(long, env = "SHARDED_KV_PARANOID_CHECKS")]
    paranoid_checks: bool,

    #[arg(long, env = "SHARDED_KV_MAX_OPEN_FILES")]
    max_open_files: Option<i32>,

    #[arg(long, env = "SHARDED_KV_WRITE_BUFFER_SIZE")]
    write_buffer_size: Option<usize>,
}

impl From<Args> for ClusterConfig {
    fn from(args: Args) -> Self {
        Self {
            node_ids: args.nodes.into_iter().map(NodeId::from).collect(),
            data_dir: args.data_dir,
            virtual_replicas: args.virtual_replicas,
            replication_factor: args.replication_factor,
            bind_addr: args.bind,
            request_timeout: Duration::from_secs(args.timeout_secs),
            engine: args.engine,
            ack_mode: args.ack_mode,
            engine_options: EngineOptions {
                paranoid_checks: args.paranoid_checks,
                max_open_files: args.max_open_files,
                write_buffer_size: args.write_buffer_size,
                sync_writes: args.sync_writes,
                ..EngineOptions::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sharded_kv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClusterConfig::from(Args::parse());
    config.validate()?;

    // 1. Storage:
    std::fs::create_dir_all(&config.data_dir)?;
    let nodes = NodeManager::with_options(config.engine.factory(), config.engine_options.clone());

    // 2. Routing:
    let ring = Arc::new(HashRing::with_replication_factor(
        config.virtual_replicas,
        config.replication_factor,
    ));
    let coordinator = Coordinator::with_policy(ring, nodes, config.ack_mode.policy());

    // 3. Nodes:
    for node_id in &config.node_ids {
        let location = config.node_location(node_id);
        if let Err(e) = coordinator.add_node(node_id.clone(), &location, &config.engine_options) {
            tracing::error!("Failed to bring up node {}: {}", node_id, e);
            if let Err(close_err) = coordinator.shutdown() {
                tracing::error!("{}", close_err);
            }
            return Err(e.into());
        }
        tracing::info!("Node {} ready at {}", node_id, location.display());
    }

    // 4. HTTP Router:
    let app = router(Arc::new(ServerState {
        coordinator: coordinator.clone(),
        request_timeout: config.request_timeout,
        data_dir: config.data_dir.clone(),
        engine_options: config.engine_options.clone(),
    }));

    // 5. Serve until Ctrl+C:
    tracing::info!(
        "Serving {} nodes ({:?} engine) on {}",
        config.node_ids.len(),
        config.engine,
        config.bind_addr
    );
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // 6. Close every engine, even if serving failed:
    tracing::info!("Closing node engines");
    if let Err(e) = coordinator.shutdown() {
        tracing::error!("{}", e);
    }

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
