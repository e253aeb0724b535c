mod api_doc;
mod config;
mod error;
mod handlers;
mod normalize;
mod proxy;
mod registry;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use config::Config;
use proxy::ProxyClient;
use registry::BackendRegistry;
use routes::RouteTable;
use state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("car-api-gateway starting");

    let config = Config::from_env()?;
    config.log_startup();

    let table = RouteTable::canonical()?;

    let registry = BackendRegistry::from_config(&config);
    registry.ensure_covers(&table)?;

    let state = AppState {
        proxy: ProxyClient::new(registry)?,
        api_doc: Arc::new(api_doc::build(&table)),
    };
    let app = routes::app(&table, state)?;

    let addr = format!("{}:{}", config.service_host, config.service_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Proxying {} routes, listening on {}", table.routes().len(), addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("car-api-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
