//! Local sync server.
//!
//! Lets a remote editor open a project on this machine, push its source
//! files chunk by chunk, run steps and fetch results.
//!
//! - [`routes`] - HTTP handlers
//! - [`origin`] - which browser pages may call the server
//! - [`response`] - the reply envelope
//! - [`state`] - shared [`SyncContext`] injected as router state
//! - [`sync`] - filesystem side of synchronisation

pub mod origin;
pub mod response;
pub mod routes;
pub mod state;
pub mod sync;

pub use origin::OriginPolicy;
pub use response::{Notice, SyncResponse};
pub use state::{AppState, ServerInfo, SyncContext, NEVER_SYNCED};

use std::net::SocketAddr;

use axum::middleware;
use axum::Router;
use tracing::{info, warn};

use crate::error::{KettleError, Result};

/// Build the complete router with middleware.
pub fn router(state: AppState) -> Router {
    let cors = origin::cors_layer(state.origins.clone());

    routes::api_router()
        .layer(middleware::from_fn_with_state(state.clone(), origin::guard))
        .layer(cors)
        .with_state(state)
}

/// Bind `host:port` and serve until Ctrl+C or SIGTERM.
///
/// Browser pages may call the server from loopback origins and from
/// `allowed_origins`.
pub async fn serve(
    host: &str,
    port: u16,
    allowed_origins: Vec<String>,
    context: SyncContext,
) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| KettleError::Sync {
            message: format!("Invalid bind address {}:{}: {}", host, port, e),
        })?;

    let state =
        AppState::new(context, ServerInfo::new(host, port)).with_origins(allowed_origins);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
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

    info!("shutdown signal received");
}
