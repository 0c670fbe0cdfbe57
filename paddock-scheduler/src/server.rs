//! Listener setup and graceful shutdown.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::SchedulerConfig;
use crate::error::{ApiError, ApiResult};

/// Resolve the listener address. A bad `PADDOCK_BIND`/`PADDOCK_PORT` pair is
/// a startup fault, not a caller error.
pub fn listen_addr(config: &SchedulerConfig) -> ApiResult<SocketAddr> {
    config
        .bind_addr()
        .map_err(|e| ApiError::internal_error(e.to_string()))
}

/// Bind a TCP listener on `addr`.
pub async fn bind(addr: SocketAddr) -> ApiResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))
}

/// Serve `app` until `shutdown` resolves, then let in-flight requests drain.
pub async fn serve_until<F>(listener: TcpListener, app: Router, shutdown: F) -> ApiResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))
}

/// Resolves on SIGINT or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
