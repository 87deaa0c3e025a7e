// ABOUTME: Unified error type, error codes and HTTP error responses for the ledger service
// ABOUTME: Maps ledger rule violations and storage failures to stable codes and status codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Every fallible operation in the crate returns [`AppResult`]. Business-rule
//! violations of the progression ledger and the redemption workflow have their
//! own [`ErrorCode`] so callers can react to them without string matching.

use std::fmt;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::constants::ledger::MINIMUM_REDEEM_POINTS;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication & Authorization (1000-1999)
    /// No credentials supplied
    AuthRequired = 1000,
    /// Credentials were supplied but are invalid or expired
    AuthInvalid = 1001,
    /// Authenticated, but the role may not perform the operation
    PermissionDenied = 1004,

    // Validation (3000-3999)
    /// Malformed or out-of-range input
    InvalidInput = 3000,

    // Resource Management (4000-4999)
    /// Entity does not exist
    ResourceNotFound = 4000,
    /// Entity with the same identity already exists
    ResourceAlreadyExists = 4001,

    // Progression ledger (7000-7099)
    /// Today's quest has already been completed
    AlreadyCompleted = 7000,
    /// Today's diet has already been logged
    AlreadyLogged = 7001,

    // Redemption workflow (7100-7199)
    /// Subscription tier does not include redemption
    TierRestricted = 7100,
    /// Requested amount is below the redemption threshold
    BelowMinimum = 7101,
    /// Requested amount exceeds the balance
    InsufficientBalance = 7102,
    /// Redemption request was already resolved
    NotPending = 7103,

    // Configuration (6000-6999)
    /// Configuration could not be loaded
    ConfigError = 6000,
    /// Configuration value is present but invalid
    ConfigInvalid = 6002,

    // Internal Errors (9000-9999)
    /// Unexpected internal failure
    InternalError = 9000,
    /// Backing store unreachable or failed
    StorageUnavailable = 9002,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput | Self::BelowMinimum => 400,
            Self::AuthRequired | Self::AuthInvalid => 401,
            Self::PermissionDenied | Self::TierRestricted => 403,
            Self::ResourceNotFound => 404,
            Self::ResourceAlreadyExists
            | Self::AlreadyCompleted
            | Self::AlreadyLogged
            | Self::NotPending => 409,
            Self::InsufficientBalance => 422,
            Self::StorageUnavailable => 503,
            Self::ConfigError | Self::ConfigInvalid | Self::InternalError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::PermissionDenied => "You do not have permission to perform this action",
            Self::InvalidInput => "The provided input is invalid",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::AlreadyCompleted => "You have already completed the daily quest today",
            Self::AlreadyLogged => "You have already logged your diet today",
            Self::TierRestricted => {
                "Point redemption is a feature available for Gold Plan members"
            }
            Self::BelowMinimum => "The requested amount is below the minimum redemption",
            Self::InsufficientBalance => "You don't have enough points to redeem that amount",
            Self::NotPending => "This redemption request has already been resolved",
            Self::ConfigError => "Configuration error encountered",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal server error occurred",
            Self::StorageUnavailable => "The service is temporarily unavailable, please retry",
        }
    }

    /// Whether the message must be hidden from API consumers
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable | Self::InternalError | Self::ConfigError | Self::ConfigInvalid
        )
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Authentication required
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Invalid authentication
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Role or ownership does not allow the operation
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Resource already exists
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Quest already completed for the current calendar day
    #[must_use]
    pub fn already_completed() -> Self {
        Self::new(
            ErrorCode::AlreadyCompleted,
            "You have already completed the daily quest today. Come back tomorrow for a new challenge.",
        )
    }

    /// Diet already logged for the current calendar day
    #[must_use]
    pub fn already_logged() -> Self {
        Self::new(
            ErrorCode::AlreadyLogged,
            "You have already logged your diet today.",
        )
    }

    /// Redemption attempted on a tier without the feature
    #[must_use]
    pub fn tier_restricted() -> Self {
        Self::new(
            ErrorCode::TierRestricted,
            "Point redemption is only available for Gold Plan members. Upgrade to redeem points.",
        )
    }

    /// Redemption amount under the threshold
    #[must_use]
    pub fn below_minimum(requested: i64) -> Self {
        Self::new(
            ErrorCode::BelowMinimum,
            format!(
                "You must redeem at least {MINIMUM_REDEEM_POINTS} points at a time (requested {requested})."
            ),
        )
    }

    /// Redemption amount above the balance
    #[must_use]
    pub fn insufficient_balance(requested: i64, balance: i64) -> Self {
        Self::new(
            ErrorCode::InsufficientBalance,
            format!("Not enough points: requested {requested}, available {balance}."),
        )
    }

    /// Redemption request no longer pending
    pub fn not_pending(status: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::NotPending,
            format!("Redemption request is already {status} and cannot be resolved again."),
        )
    }

    /// Storage backend failure
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageUnavailable, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Invalid configuration value
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::storage(format!("Database operation failed: {error}")).with_source(error)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_input(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_input(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Body of an [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Stable error code
    pub code: ErrorCode,
    /// Actionable message
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        let message = if error.code.is_opaque() {
            error.code.description().to_owned()
        } else {
            error.message.clone()
        };
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.code.is_opaque() {
            error!(error.code = ?self.code, error.message = %self.message, "Request failed");
        }
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
