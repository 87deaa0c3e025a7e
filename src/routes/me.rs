// ABOUTME: Route handlers for the caller's account snapshot and personal history
// ABOUTME: Also covers profile edits and the community streak leaderboard
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use super::{authenticate, ApiJson, ApiQuery};
use crate::errors::AppError;
use crate::models::{
    AccountSnapshot, DailyCompletion, DietLog, LeaderboardEntry, RedemptionHistoryEntry,
    WeightSample,
};
use crate::resources::ServerResources;
use crate::services::UpdateProfile;

/// Query parameters for GET /api/leaderboard
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    /// Number of entries
    pub limit: Option<i64>,
}

/// Account routes implementation
pub struct AccountRoutes;

impl AccountRoutes {
    /// Create all account routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/account", get(Self::handle_snapshot))
            .route("/api/account/profile", put(Self::handle_update_profile))
            .route("/api/leaderboard", get(Self::handle_leaderboard))
            .route("/api/history/workouts", get(Self::handle_workouts))
            .route("/api/history/diet", get(Self::handle_diet))
            .route("/api/history/weight", get(Self::handle_weight))
            .route("/api/history/redemptions", get(Self::handle_redemptions))
            .with_state(resources)
    }

    /// Handle GET /api/account
    async fn handle_snapshot(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<AccountSnapshot>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.ledger.snapshot(&ctx).await?))
    }

    /// Handle PUT /api/account/profile
    async fn handle_update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(body): ApiJson<UpdateProfile>,
    ) -> Result<Json<AccountSnapshot>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.accounts.update_profile(&ctx, body).await?))
    }

    /// Handle GET /api/leaderboard
    async fn handle_leaderboard(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiQuery(query): ApiQuery<LeaderboardQuery>,
    ) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
        authenticate(&headers, &resources)?;
        Ok(Json(resources.accounts.leaderboard(query.limit).await?))
    }

    /// Handle GET /api/history/workouts
    async fn handle_workouts(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<DailyCompletion>>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.ledger.workout_history(&ctx).await?))
    }

    /// Handle GET /api/history/diet
    async fn handle_diet(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<DietLog>>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.ledger.diet_history(&ctx).await?))
    }

    /// Handle GET /api/history/weight
    async fn handle_weight(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<WeightSample>>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.ledger.weight_history(&ctx).await?))
    }

    /// Handle GET /api/history/redemptions
    async fn handle_redemptions(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<RedemptionHistoryEntry>>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.redemptions.history(&ctx).await?))
    }
}
