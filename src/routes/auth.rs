// ABOUTME: Registration and login route handlers issuing bearer tokens
// ABOUTME: Members join an existing gym, gym owners create theirs while registering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::ApiJson;
use crate::errors::AppError;
use crate::models::Gym;
use crate::resources::ServerResources;
use crate::services::{AuthSession, RegisterGymOwner, RegisterMember};

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: String,
    /// Password
    pub password: String,
}

/// Gym owner registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct GymOwnerRegistrationResponse {
    /// Token and account state
    #[serde(flatten)]
    pub session: AuthSession,
    /// The created gym
    pub gym: Gym,
}

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::handle_register))
            .route(
                "/api/auth/register-gym-owner",
                post(Self::handle_register_gym_owner),
            )
            .route("/api/auth/login", post(Self::handle_login))
            .with_state(resources)
    }

    /// Handle POST /api/auth/register
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        ApiJson(body): ApiJson<RegisterMember>,
    ) -> Result<Response, AppError> {
        let session = resources.accounts.register_user(body).await?;
        Ok((StatusCode::CREATED, Json(session)).into_response())
    }

    /// Handle POST /api/auth/register-gym-owner
    async fn handle_register_gym_owner(
        State(resources): State<Arc<ServerResources>>,
        ApiJson(body): ApiJson<RegisterGymOwner>,
    ) -> Result<Response, AppError> {
        let (session, gym) = resources.accounts.register_gym_owner(body).await?;
        let response = GymOwnerRegistrationResponse { session, gym };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle POST /api/auth/login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        ApiJson(body): ApiJson<LoginRequest>,
    ) -> Result<Response, AppError> {
        let session = resources.accounts.login(&body.email, &body.password).await?;
        Ok((StatusCode::OK, Json(session)).into_response())
    }
}
