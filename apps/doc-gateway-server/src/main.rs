//! Binary entry point: parse CLI args, load layered configuration, wire the
//! in-memory collaborator implementations into [`doc_gateway_server::state::AppState`],
//! and serve the assembled router.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use doc_collab::memory::{
    InMemoryAuthClient, InMemoryOperationService, InMemoryOrganizationRepository,
    PermissiveSecurityEvaluator,
};
use doc_gateway_server::config::GatewayConfig;
use doc_gateway_server::state::AppState;
use doc_gateway_server::router;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Document-database gateway: a Firestore-shaped HTTP surface over a
/// pluggable storage/query backend.
#[derive(Parser)]
#[command(name = "doc-gateway-server")]
#[command(about = "Document-database gateway server")]
struct Cli {
    /// Path to a YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address override (e.g. 0.0.0.0:9090).
    #[arg(short, long)]
    bind: Option<std::net::SocketAddr>,
}

fn init_logging(config: &GatewayConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let registry = tracing_subscriber::registry().with(filter);

    if config.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.config.as_deref() {
        if !path.is_file() {
            anyhow::bail!("config file does not exist: {}", path.display());
        }
    }

    let mut config = GatewayConfig::load(cli.config.as_deref().and_then(|p| p.to_str()))?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }

    init_logging(&config);

    tracing::info!(bind_addr = %config.bind_addr, "starting doc-gateway-server");

    let state = Arc::new(AppState::new(
        Arc::new(config.clone()),
        Arc::new(InMemoryOperationService::new()),
        Arc::new(InMemoryAuthClient::new()),
        Arc::new(PermissiveSecurityEvaluator::new()),
        Arc::new(InMemoryOrganizationRepository::new()),
    ));

    // Root cancellation token for the process (spec §5): every request's
    // `RequestContext::cancellation_token()` is a child of this one, so
    // cancelling it on shutdown cascades into every in-flight request,
    // mirroring the teacher's own root-token-per-process pattern.
    let root_cancellation = state.root_cancellation.clone();
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received, cancelling in-flight requests");
            root_cancellation.cancel();
        })
        .await?;

    Ok(())
}
