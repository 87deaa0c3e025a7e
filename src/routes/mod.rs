// ABOUTME: Route module organization for the Level Up Fitness HTTP endpoints
// ABOUTME: Handlers authenticate the bearer token and delegate to the service layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! HTTP routes
//!
//! Each domain module contains route definitions and thin handlers that
//! translate requests into service calls. Errors render through
//! [`AppError`]'s `IntoResponse` implementation.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::auth::AccountContext;
use crate::errors::{AppError, AppResult};
use crate::resources::ServerResources;

/// Administrator overview, subscriptions and redemption resolution
pub mod admin;
/// Registration and login
pub mod auth;
/// Live account snapshot stream
pub mod events;
/// Body and query extractors with enveloped rejections
pub mod extract;
/// Gym listing, rosters, member progress and plan assignment
pub mod gym;
/// Liveness and readiness checks
pub mod health;
/// Account snapshot and history
pub mod me;
/// Daily quest, diet, weight and today's plan
pub mod quests;
/// Member redemption requests
pub mod redemptions;

pub use admin::AdminRoutes;
pub use auth::AuthRoutes;
pub use events::EventRoutes;
pub use extract::{ApiJson, ApiQuery};
pub use gym::GymRoutes;
pub use health::HealthRoutes;
pub use me::AccountRoutes;
pub use quests::QuestRoutes;
pub use redemptions::RedemptionRoutes;

/// Resolve the caller from the `Authorization` header
///
/// # Errors
///
/// Returns `AuthRequired` without a header and `AuthInvalid` for a bad token
pub fn authenticate(headers: &HeaderMap, resources: &ServerResources) -> AppResult<AccountContext> {
    let authorization = headers
        .get(AUTHORIZATION)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| AppError::auth_invalid("Authorization header is not valid UTF-8"))
        })
        .transpose()?;
    resources.auth.authenticate(authorization)
}
