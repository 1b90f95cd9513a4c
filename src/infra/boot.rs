use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::{AppState, Dispatcher};
use crate::clients::{Earth2Client, ForecastBackend};
use crate::core::mcp::ServerInfo;
use crate::infra::config::Config;
use crate::resources::catalog::build_resources;
use crate::tools::forecast::build_registry;

/// Registries and dispatcher, built once before the first request.
pub fn build_state(cfg: &Config, backend: Arc<dyn ForecastBackend>) -> AppState {
    let server = ServerInfo {
        name: cfg.server_name.clone(),
        version: cfg.server_version.clone(),
    };
    let tools = build_registry(backend.clone());
    let resources = build_resources(backend.clone(), server.clone(), tools.names());
    tracing::info!(
        tools = tools.len(),
        resources = resources.len(),
        "registries initialized"
    );
    AppState::new(Dispatcher::new(server, tools, resources, backend))
}

pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    crate::infra::logging::init(&cfg.log_level);
    cfg.validate()?;
    tracing::info!(
        port = cfg.port,
        server = %cfg.server_name,
        version = %cfg.server_version,
        downstream = %cfg.earth2.base_url,
        "BOOT earth2-mcp-gateway"
    );

    let backend: Arc<dyn ForecastBackend> = Arc::new(Earth2Client::from_config(&cfg.earth2)?);
    let app = crate::infra::http_app::build_app(build_state(&cfg, backend));

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
