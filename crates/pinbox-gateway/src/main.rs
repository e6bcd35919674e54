//! Pinbox Gateway - upload and listing front end for an IPFS-pinned bucket

use clap::Parser;
use pinbox_gateway::config::DEFAULT_IPFS_GATEWAY;
use pinbox_gateway::limits::DEFAULT_MAX_UPLOAD_BYTES;
use pinbox_gateway::{run_server_with_shutdown, GatewayConfig};
use pinbox_store::config::{DEFAULT_ENDPOINT, DEFAULT_REGION};
use pinbox_store::S3Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pinbox-gateway")]
#[command(about = "Upload and listing gateway for IPFS-pinned S3 buckets")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "PINBOX_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "PINBOX_PORT")]
    port: u16,

    /// S3 access key ID
    #[arg(long, env = "FOUR_S3_KEY", hide_env_values = true)]
    s3_key: Option<String>,

    /// S3 secret access key
    #[arg(long, env = "FOUR_S3_SECRET", hide_env_values = true)]
    s3_secret: Option<String>,

    /// S3 endpoint URL
    #[arg(long, default_value = DEFAULT_ENDPOINT, env = "FOUR_S3_ENDPOINT")]
    s3_endpoint: String,

    /// S3 signing region
    #[arg(long, default_value = DEFAULT_REGION, env = "FOUR_S3_REGION")]
    s3_region: String,

    /// Bucket uploads are written to
    #[arg(long, env = "FOUR_BUCKET")]
    bucket: Option<String>,

    /// Maximum file size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "PINBOX_MAX_UPLOAD_BYTES")]
    max_upload_bytes: u64,

    /// Maximum concurrent metadata reads per list request
    #[arg(long, default_value_t = 16, env = "PINBOX_LIST_CONCURRENCY")]
    list_concurrency: usize,

    /// Public IPFS gateway prefix
    #[arg(long, default_value = DEFAULT_IPFS_GATEWAY, env = "IPFS_GATEWAY_URL")]
    ipfs_gateway_url: String,

    /// Use in-memory storage (for testing, data will not persist)
    #[arg(long, env = "PINBOX_MEMORY_STORE")]
    memory_store: bool,

    /// Assign CIDs in the in-memory store after this many milliseconds
    #[arg(long, env = "PINBOX_SIMULATE_PIN_MS")]
    simulate_pin_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, env = "PINBOX_DEBUG")]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "PINBOX_LOG_JSON")]
    log_json: bool,
}

fn init_tracing(debug: bool, json: bool) {
    let log_level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "pinbox_gateway={level},pinbox_store={level},tower_http={level}",
            level = log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.debug, args.log_json);

    tracing::info!("Starting Pinbox Gateway on {}:{}", args.host, args.port);

    let s3 = S3Config::from_parts(args.s3_key, args.s3_secret, args.bucket)
        .map(|c| c.with_endpoint(args.s3_endpoint).with_region(args.s3_region));

    if args.memory_store {
        tracing::warn!("⚠️  Using in-memory storage - data will NOT persist!");
    } else if s3.is_none() {
        tracing::warn!("⚠️  S3 credentials or FOUR_BUCKET not set - storage endpoints will return 500");
    }

    let config = GatewayConfig {
        host: args.host,
        port: args.port,
        s3,
        use_memory_store: args.memory_store,
        simulate_pin_ms: args.simulate_pin_ms,
        max_upload_bytes: args.max_upload_bytes,
        list_concurrency: args.list_concurrency,
        ipfs_gateway_url: args.ipfs_gateway_url,
    };

    run_server_with_shutdown(config, shutdown_signal()).await
}
