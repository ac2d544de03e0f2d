// Visor - vision analysis over HTTP
// Launch and it's ready - models are fetched on first start

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use visor_core::VisionConfig;
use visor_server::http::{create_router, ApiState};

#[derive(Parser, Debug)]
#[command(name = "visor-server", about = "Vision analysis HTTP service")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Directory for model artifacts (defaults to ~/.visor/models)
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let args = Args::parse();

    info!("🚀 Starting Visor...");

    let mut config = VisionConfig::default();
    if let Some(dir) = args.model_dir {
        config.model_dir = dir;
    }
    config.validate().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    info!("👁️  Initializing analyzers (model dir: {:?})...", config.model_dir);
    let orchestrator = Arc::new(visor_vision::bootstrap_analyzers(Arc::new(config)).await);
    let capabilities = orchestrator.capabilities();
    info!(
        "✅ Analyzers ready (emotion: {}, fingers: {}, objects: {})",
        capabilities.emotion, capabilities.fingers, capabilities.objects
    );

    let app = create_router(ApiState { orchestrator });
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 HTTP server listening on http://{}", addr);
    info!("🎯 Visor is ready! Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    info!("👋 Visor stopped. Goodbye!");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("🛑 Received Ctrl+C, shutting down..."),
        _ = terminate => info!("🛑 Received SIGTERM, shutting down..."),
    }
}
