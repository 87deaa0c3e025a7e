// ABOUTME: Configuration module root for environment-driven server settings
// ABOUTME: Re-exports the database, auth, ledger and server configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration loaded from environment variables (and an optional `.env` file).

/// Database URL and pool settings
pub mod database;
/// Server, auth and ledger settings
pub mod environment;

pub use database::{DatabaseConfig, DatabaseUrl};
pub use environment::{
    AdminBootstrap, AuthConfig, Environment, LedgerConfig, LogLevel, ServerConfig,
};
