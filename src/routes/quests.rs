// ABOUTME: Route handlers for the daily quest, diet log, weight samples and today's plan
// ABOUTME: Quest and diet writes return the refreshed account snapshot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::{authenticate, ApiJson};
use crate::errors::AppError;
use crate::models::{MealEntries, TodaysPlan};
use crate::resources::ServerResources;

// ============================================================================
// Request Types
// ============================================================================

/// Quest completion body
#[derive(Debug, Deserialize)]
pub struct CompleteQuestRequest {
    /// Exercises the member finished
    #[serde(default)]
    pub exercises: Vec<String>,
    /// Points to award
    pub points_earned: i64,
}

/// Weight sample body
#[derive(Debug, Deserialize)]
pub struct LogWeightRequest {
    /// Body weight in kilograms
    pub weight_kg: f64,
}

// ============================================================================
// Routes
// ============================================================================

/// Daily quest routes implementation
pub struct QuestRoutes;

impl QuestRoutes {
    /// Create all daily quest routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/quests/complete", post(Self::handle_complete_quest))
            .route("/api/diet", post(Self::handle_log_diet))
            .route("/api/weight", post(Self::handle_log_weight))
            .route("/api/plans/today", get(Self::handle_todays_plan))
            .with_state(resources)
    }

    /// Handle POST /api/quests/complete
    async fn handle_complete_quest(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(body): ApiJson<CompleteQuestRequest>,
    ) -> Result<Response, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        let snapshot = resources
            .ledger
            .complete_quest(&ctx, body.exercises, body.points_earned)
            .await?;
        Ok((StatusCode::OK, Json(snapshot)).into_response())
    }

    /// Handle POST /api/diet
    async fn handle_log_diet(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(body): ApiJson<MealEntries>,
    ) -> Result<Response, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        let snapshot = resources.ledger.log_diet(&ctx, body).await?;
        Ok((StatusCode::OK, Json(snapshot)).into_response())
    }

    /// Handle POST /api/weight
    async fn handle_log_weight(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(body): ApiJson<LogWeightRequest>,
    ) -> Result<Response, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        let sample = resources.ledger.log_weight(&ctx, body.weight_kg).await?;
        Ok((StatusCode::CREATED, Json(sample)).into_response())
    }

    /// Handle GET /api/plans/today
    async fn handle_todays_plan(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<TodaysPlan>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.plans.todays_plan(&ctx).await?))
    }
}
