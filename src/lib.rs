// ABOUTME: Main library entry point for the Level Up Fitness progression service
// ABOUTME: Provides the points ledger, redemption workflow and the REST API around them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Level Up Fitness
//!
//! Gym members earn points by completing one workout quest and logging one
//! diet entry per calendar day. Points drive a level and a themed hunter
//! class. Gold members can cash points out through a two-phase redemption
//! request that an administrator approves or rejects.
//!
//! ## Architecture
//!
//! - **Database**: `SQLite` storage with guarded, single-statement ledger updates
//! - **Services**: Capability checks, validation and event publishing
//! - **Routes**: axum handlers translating HTTP into service calls
//! - **Notifications**: Per-account snapshot broadcast behind an SSE endpoint
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use level_up_fitness::config::ServerConfig;
//! use level_up_fitness::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Level Up Fitness configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Bearer tokens, account context and password hashing
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// Ledger, plan and service constants
pub mod constants;

/// `SQLite` storage managers and transactions
pub mod database;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Domain models
pub mod models;

/// Live account snapshot broadcast
pub mod notifications;

/// Role and tier capability table
pub mod permissions;

/// Workout plan text parsing
pub mod plans;

/// Level math, hunter classes and calendar days
pub mod progression;

/// Shared server resources
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// HTTP server assembly
pub mod server;

/// Domain services
pub mod services;
