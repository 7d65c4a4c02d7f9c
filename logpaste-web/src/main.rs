use clap::Parser;
use logpaste_core::AppConfig;
use logpaste_web::{create_app, spawn_expiry_task, AppState};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "logpaste-web", version, about = "LogPaste HTTP API server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "LOGPASTE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind (overrides configuration)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides configuration)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let state = AppState::new(config).await?;
    let config = state.config.clone();

    spawn_expiry_task(
        state.store.clone(),
        Duration::from_secs(config.storage.purge_interval_secs.max(1)),
    );

    let app = create_app(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(
        "Server configuration: storage_time={}s, max_length={}, max_lines={}, max_upload={}",
        config.storage.storage_time,
        config.storage.max_length,
        config.storage.max_lines,
        config.server.max_upload_size
    );

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("LogPaste API listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
