// ABOUTME: Route handlers for gyms, gym rosters, member progress and per-day plans
// ABOUTME: Coaches reach a member's records only through their own gym or as administrators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::{authenticate, ApiJson};
use crate::constants::plans::PLAN_DATE_FORMAT;
use crate::errors::AppError;
use crate::models::{AccountSnapshot, DailyPlan, Gym, MemberProgress, PlanSource};
use crate::resources::ServerResources;
use crate::services::{AssignPlan, UpdateGym};

/// Plan body for PUT /api/members/:id/plans/:date
#[derive(Debug, Deserialize)]
pub struct PlanBody {
    /// Workout text
    #[serde(default)]
    pub workout_plan: Option<String>,
    /// Diet text
    #[serde(default)]
    pub diet_plan: Option<String>,
    /// Authoring source
    #[serde(default)]
    pub source: PlanSource,
}

/// Gym routes implementation
pub struct GymRoutes;

impl GymRoutes {
    /// Create all gym routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/gyms", get(Self::handle_list_gyms))
            .route("/api/gym", put(Self::handle_update_gym))
            .route("/api/gym/members", get(Self::handle_list_members))
            .route(
                "/api/gym/members/:id/progress",
                get(Self::handle_member_progress),
            )
            .route(
                "/api/members/:id/plans/:date",
                get(Self::handle_get_plan).put(Self::handle_assign_plan),
            )
            .with_state(resources)
    }

    /// Handle GET /api/gyms, public for the registration picker
    async fn handle_list_gyms(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<Vec<Gym>>, AppError> {
        Ok(Json(resources.accounts.list_gyms().await?))
    }

    /// Handle PUT /api/gym
    async fn handle_update_gym(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(body): ApiJson<UpdateGym>,
    ) -> Result<Json<Gym>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.accounts.update_gym(&ctx, body).await?))
    }

    /// Handle GET /api/gym/members
    async fn handle_list_members(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<AccountSnapshot>>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        Ok(Json(resources.accounts.list_gym_members(&ctx).await?))
    }

    /// Handle GET /api/gym/members/:id/progress
    async fn handle_member_progress(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Json<MemberProgress>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        let member_id = parse_member_id(&id)?;
        Ok(Json(resources.accounts.member_progress(&ctx, member_id).await?))
    }

    /// Handle GET /api/members/:id/plans/:date
    async fn handle_get_plan(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((id, date)): Path<(String, String)>,
    ) -> Result<Json<DailyPlan>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        let member_id = parse_member_id(&id)?;
        let date = parse_plan_date(&date)?;
        resources
            .plans
            .member_plan(&ctx, member_id, date)
            .await?
            .map(Json)
            .ok_or_else(|| AppError::not_found(format!("Plan for {date}")))
    }

    /// Handle PUT /api/members/:id/plans/:date
    async fn handle_assign_plan(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((id, date)): Path<(String, String)>,
        ApiJson(body): ApiJson<PlanBody>,
    ) -> Result<Json<DailyPlan>, AppError> {
        let ctx = authenticate(&headers, &resources)?;
        let input = AssignPlan {
            member_id: parse_member_id(&id)?,
            date: parse_plan_date(&date)?,
            workout_plan: body.workout_plan,
            diet_plan: body.diet_plan,
            source: body.source,
        };
        Ok(Json(resources.plans.assign_plan(&ctx, input).await?))
    }
}

fn parse_member_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::invalid_input("Invalid member ID format"))
}

fn parse_plan_date(date: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(date, PLAN_DATE_FORMAT)
        .map_err(|_| AppError::invalid_input(format!("Invalid plan date '{date}', expected YYYY-MM-DD")))
}
