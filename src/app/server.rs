use crate::adapters::backend::BackendClient;
use crate::app::settings::{self, SettingsState};
use crate::config::ConsoleConfig;
use crate::core::proxy::{self, Forwarder};
use crate::core::resolver::BaseUrlResolver;
use crate::utils::error::Result;
use crate::utils::validation::validate_listen_addr;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Proxy plus settings endpoints, all sharing one resolver.
pub fn build_router(config: &ConsoleConfig, resolver: Arc<BaseUrlResolver>) -> Router {
    let forwarder = Forwarder::new(Arc::clone(&resolver), &config.server.proxy_prefix)
        .with_body_limit(config.server.max_body_bytes);
    let state = SettingsState {
        api: Arc::new(BackendClient::new(Arc::clone(&resolver))),
        resolver,
        environment: config.environment(),
    };

    Router::new()
        .merge(proxy::routes(forwarder))
        .merge(settings::routes(state))
}

pub async fn serve(config: &ConsoleConfig, resolver: Arc<BaseUrlResolver>) -> Result<()> {
    let addr = validate_listen_addr("server.listen", &config.server.listen)?;
    let router = build_router(config, Arc::clone(&resolver));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        "Listening on {} (proxy prefix {}, backend {})",
        listener.local_addr()?,
        config.server.proxy_prefix,
        resolver.resolve()
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
