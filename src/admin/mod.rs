//! Read-only admin HTTP surface.
//!
//! # Routes
//! - `GET /status`: current [`StatusSnapshot`](crate::monitor::StatusSnapshot)
//! - `GET /check`: run an on-demand probe (does not notify subscribers)
//! - `GET /health`: liveness

pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::monitor::Monitor;
use self::handlers::{check_now, get_health, get_status};

#[derive(Clone)]
pub struct AdminState {
    pub monitor: Arc<Monitor>,
}

#[allow(deprecated)]
pub fn setup_admin_router(state: AdminState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/check", get(check_now))
        .route("/health", get(get_health))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Serve the admin router until shutdown is signalled.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Admin server stopped");
    Ok(())
}
