// ABOUTME: Server-sent event stream of the caller's account snapshots
// ABOUTME: Sends the current snapshot on connect, then one event per committed change
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{info, warn};

use super::{authenticate, ApiQuery};
use crate::errors::AppError;
use crate::models::AccountSnapshot;
use crate::resources::ServerResources;

const SNAPSHOT_EVENT: &str = "snapshot";

/// Query parameters for clients that cannot set headers, such as `EventSource`
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Bearer token
    pub token: Option<String>,
}

/// Live event routes implementation
pub struct EventRoutes;

impl EventRoutes {
    /// Create all live event routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/account/events", get(Self::handle_events))
            .with_state(resources)
    }

    /// Handle GET /api/account/events
    async fn handle_events(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiQuery(query): ApiQuery<EventsQuery>,
    ) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
        let ctx = match query.token.as_deref() {
            Some(token) => resources.auth.validate_token(token)?,
            None => authenticate(&headers, &resources)?,
        };

        // Subscribe before reading so no commit between the two is lost.
        let updates = resources.events.subscribe_stream(ctx.account_id).await;
        let current = resources.ledger.snapshot(&ctx).await?;
        info!(account.id = %ctx.account_id, "Account event stream opened");

        let stream = async_stream::stream! {
            if let Some(event) = snapshot_event(&current) {
                yield Ok(event);
            }
            let mut updates = Box::pin(updates);
            while let Some(snapshot) = updates.next().await {
                if let Some(event) = snapshot_event(&snapshot) {
                    yield Ok(event);
                }
            }
        };

        Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
    }
}

fn snapshot_event(snapshot: &AccountSnapshot) -> Option<Event> {
    match Event::default().event(SNAPSHOT_EVENT).json_data(snapshot) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(account.id = %snapshot.account_id, "Failed to encode snapshot event: {e}");
            None
        }
    }
}
