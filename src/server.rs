// ABOUTME: HTTP server assembly merging every route group behind request tracing
// ABOUTME: Serves until ctrl-c, then drains in-flight requests and closes the pool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};
use crate::resources::ServerResources;
use crate::routes::{
    AccountRoutes, AdminRoutes, AuthRoutes, EventRoutes, GymRoutes, HealthRoutes, QuestRoutes,
    RedemptionRoutes,
};

/// Build the full application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(AccountRoutes::routes(resources.clone()))
        .merge(EventRoutes::routes(resources.clone()))
        .merge(QuestRoutes::routes(resources.clone()))
        .merge(RedemptionRoutes::routes(resources.clone()))
        .merge(GymRoutes::routes(resources.clone()))
        .merge(AdminRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
}

/// Serve the API on `port` until a shutdown signal arrives
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails
pub async fn serve(resources: Arc<ServerResources>, port: u16) -> AppResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!("Listening on http://{addr}");

    let app = build_router(resources.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("HTTP server error: {e}")))?;

    resources.database.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
