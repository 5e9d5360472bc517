//! Router assembly and the serve loop
//!
//! CORS admits the local presentation layer unless `cors_permissive` is set.
//! The server drains in-flight requests on Ctrl+C or SIGTERM, then closes
//! the store.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::state::AppState;

pub const DEFAULT_PORT: u16 = 3030;

/// Origins of a locally running presentation layer
const LOCAL_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:3030",
    "http://127.0.0.1:3030",
];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Accept requests from any origin
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            cors_permissive: false,
        }
    }
}

fn cors_layer(permissive: bool) -> CorsLayer {
    if permissive {
        tracing::warn!("CORS open to all origins");
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(LOCAL_ORIGINS.map(HeaderValue::from_static))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Every route, with CORS and request tracing applied.
pub fn build_router(state: AppState, cors_permissive: bool) -> Router {
    let api = [
        routes::health::router(),
        routes::feed::router(),
        routes::threads::router(),
        routes::users::router(),
        routes::search::router(),
        routes::communities::router(),
    ]
    .into_iter()
    .fold(Router::new(), Router::merge);

    api.layer(cors_layer(cors_permissive))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until a shutdown signal, then release the store's connections.
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        store = state.store_kind(),
        "Listening"
    );

    let app = build_router(state.clone(), config.cors_permissive);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_requested())
        .await?;

    state.close().await;
    tracing::info!("Stopped");
    Ok(())
}

/// Resolves on the first of Ctrl+C or SIGTERM. A signal that cannot be
/// installed is logged and never fires.
async fn shutdown_requested() {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "interrupt",
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for Ctrl+C");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "terminate"
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let signal = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };
    tracing::info!(signal, "Shutting down");
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to serve: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_loopback() {
        let config = ServerConfig::default();
        assert!(config.bind_addr.ip().is_loopback());
        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert!(!config.cors_permissive);
    }
}
