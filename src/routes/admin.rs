// ABOUTME: Administrator route handlers for the account overview, subscriptions and payouts
// ABOUTME: Pending redemptions are listed newest first and resolved exactly once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{authenticate, ApiJson};
use crate::errors::AppError;
use crate::models::{AccountSnapshot, GymSummary, RedemptionDecision, RedemptionRequest, SubscriptionTier};
use crate::resources::ServerResources;

/// Subscription change body
#[derive(Debug, Deserialize)]
pub struct UpdateSubscriptionRequest {
    /// New tier
    pub subscription_tier: SubscriptionTier,
}

/// Redemption resolution body
#[derive(Debug, Deserialize)]
pub struct ResolveRedemptionRequest {
    /// Approve or reject
    pub decision: RedemptionDecision,
}

/// Admin routes implementation
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/accounts", get(Self::handle_list_accounts))
            .route("/api/admin/gyms", get(Self::handle_list_gyms))
            .route("/api/admin/gyms/:id/members", get(Self::handle_gym_members))
            .route(
                "/api/admin/accounts/:id/subscription",
                put(Self::handle_update_subscription),
            )
            .route(
                "/api/admin/redemptions/pending",
                get(Self::handle_list_pending),
            )
            .route(
                "/api/admin/redemptions/:id/resolve",
                post(Self::handle_resolve),
            )
            .with_state(resources)
    }

    /// Handle GET /api/admin/accounts
    async fn handle_list_accounts(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<AccountSnapshot>>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.accounts.admin_accounts(&ctx).await?))
    }

    /// Handle GET /api/admin/gyms
    async fn handle_list_gyms(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<GymSummary>>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.accounts.admin_gyms(&ctx).await?))
    }

    /// Handle GET /api/admin/gyms/:id/members
    async fn handle_gym_members(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Json<Vec<AccountSnapshot>>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        let gym_id =
            Uuid::parse_str(&id).map_err(|_| AppError::invalid_input("Invalid gym ID format"))?;
        Ok(Json(resources.accounts.admin_gym_members(&ctx, gym_id).await?))
    }

    /// Handle PUT /api/admin/accounts/:id/subscription
    async fn handle_update_subscription(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        ApiJson(body): ApiJson<UpdateSubscriptionRequest>,
    ) -> Result<Json<AccountSnapshot>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        let account_id =
            Uuid::parse_str(&id).map_err(|_| AppError::invalid_input("Invalid account ID format"))?;
        let snapshot = resources
            .accounts
            .update_subscription(&ctx, account_id, body.subscription_tier)
            .await?;
        Ok(Json(snapshot))
    }

    /// Handle GET /api/admin/redemptions/pending
    async fn handle_list_pending(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<RedemptionRequest>>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.redemptions.list_pending_redemptions(&ctx).await?))
    }

    /// Handle POST /api/admin/redemptions/:id/resolve
    async fn handle_resolve(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        ApiJson(body): ApiJson<ResolveRedemptionRequest>,
    ) -> Result<Json<RedemptionRequest>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        let request_id =
            Uuid::parse_str(&id).map_err(|_| AppError::invalid_input("Invalid request ID format"))?;
        let request = resources
            .redemptions
            .resolve_redemption(&ctx, request_id, body.decision)
            .await?;
        Ok(Json(request))
    }
}
