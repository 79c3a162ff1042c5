//! AkaveLink gateway - JSON REST API for buckets and files

use akavelink_gateway::{body_limit, run_server, GatewayConfig};
use akavelink_storage::MemoryStorageClient;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "akavelink")]
#[command(about = "HTTP gateway for AkaveLink buckets and files")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "AKAVELINK_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "AKAVELINK_PORT")]
    port: u16,

    /// Size of the pieces uploads are cut into (bytes)
    #[arg(long, default_value = "1048576", env = "AKAVELINK_BLOCK_PART_SIZE")]
    block_part_size: usize,

    /// Pause after each file delete while emptying a bucket (milliseconds)
    #[arg(long, default_value = "1000", env = "AKAVELINK_DELETE_PAUSE_MS")]
    delete_pause_ms: u64,

    /// Create a missing bucket on upload
    #[arg(long, default_value_t = true, action = ArgAction::Set, env = "AKAVELINK_AUTO_CREATE_BUCKET")]
    auto_create_bucket: bool,

    /// Minimum spacing the backend enforces between deletions on one bucket (milliseconds)
    #[arg(long, default_value = "0", env = "AKAVELINK_SETTLE_TIME_MS")]
    settle_time_ms: u64,

    /// Requests per second across the gateway, 0 disables limiting
    #[arg(long, default_value = "100", env = "AKAVELINK_RATE_LIMIT_RPS")]
    rate_limit_rps: u32,

    /// Maximum request body size (bytes)
    #[arg(long, default_value = "5368709120", env = "AKAVELINK_MAX_BODY_SIZE")]
    max_body_size: u64,

    /// Disable CORS headers
    #[arg(long, env = "AKAVELINK_NO_CORS")]
    no_cors: bool,

    /// Enable debug logging
    #[arg(short, long, env = "AKAVELINK_DEBUG")]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "AKAVELINK_LOG_JSON")]
    log_json: bool,
}

// DOTENV_PATH wins; otherwise the nearest .env walking up from the working directory
fn load_env() -> Result<PathBuf, dotenvy::Error> {
    match std::env::var_os("DOTENV_PATH") {
        Some(path) => {
            let path = PathBuf::from(path);
            dotenvy::from_path(&path)?;
            Ok(path)
        }
        None => dotenvy::dotenv(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before parsing so it can feed env-backed flags and RUST_LOG
    let env_file = load_env();

    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("akavelink={log_level},tower_http=debug").into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    match env_file {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) => tracing::warn!(
            "Could not load .env file ({}), relying on system environment",
            e
        ),
    }

    tracing::info!("Starting AkaveLink gateway on {}:{}", args.host, args.port);
    tracing::warn!("Using in-memory storage - data will NOT persist");
    if !args.auto_create_bucket {
        tracing::info!("Bucket auto-creation on upload is disabled");
    }

    // Build configuration
    let config = GatewayConfig {
        host: args.host,
        port: args.port,
        block_part_size: args.block_part_size,
        delete_pause_ms: args.delete_pause_ms,
        auto_create_bucket: args.auto_create_bucket,
        settle_time_ms: args.settle_time_ms,
        rate_limit_rps: args.rate_limit_rps,
        max_body_size: body_limit(args.max_body_size),
        cors_enabled: !args.no_cors,
    };

    let client = Arc::new(MemoryStorageClient::with_config(config.storage_config()));

    run_server(config, client).await
}
