// ABOUTME: Route handlers for member redemption requests
// ABOUTME: Creating a request debits the points immediately and leaves it pending review
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::{authenticate, ApiJson};
use crate::errors::AppError;
use crate::models::RedemptionRequest;
use crate::resources::ServerResources;

/// Redemption request body
#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    /// Points to cash out
    pub points: i64,
    /// Payout destination such as a UPI id
    pub payout_destination: String,
}

/// Redemption routes implementation
pub struct RedemptionRoutes;

impl RedemptionRoutes {
    /// Create all redemption routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/redemptions",
                get(Self::handle_list_mine).post(Self::handle_request),
            )
            .with_state(resources)
    }

    /// Handle POST /api/redemptions
    async fn handle_request(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(body): ApiJson<RedeemRequest>,
    ) -> Result<Response, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        let receipt = resources
            .redemptions
            .request_redemption(&ctx, body.points, &body.payout_destination)
            .await?;
        Ok((StatusCode::CREATED, Json(receipt)).into_response())
    }

    /// Handle GET /api/redemptions
    async fn handle_list_mine(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<RedemptionRequest>>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.redemptions.my_requests(&ctx).await?))
    }
}
