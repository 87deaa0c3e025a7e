// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory resources, quiet logging and member, owner and admin fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `level_up_fitness`

use std::path::Path;
use std::sync::{Arc, Once};

use anyhow::Result;
use level_up_fitness::{
    auth::{AccountContext, AuthManager},
    config::{
        AuthConfig, DatabaseConfig, DatabaseUrl, Environment, LedgerConfig, LogLevel,
        ServerConfig,
    },
    constants::ledger::POINTS_PER_LEVEL,
    database::Database,
    models::{Gym, Role, SubscriptionTier},
    resources::ServerResources,
    services::{AuthSession, RegisterGymOwner, RegisterMember},
};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

pub const TEST_JWT_SECRET: &str = "level-up-fitness-test-secret-0123456789";
pub const TEST_PASSWORD: &str = "arise-hunter";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration for an in-memory test server
pub fn test_config(ledger: LedgerConfig) -> ServerConfig {
    ServerConfig {
        http_port: 0,
        environment: Environment::Testing,
        log_level: LogLevel::Warn,
        database: DatabaseConfig::memory(),
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_owned(),
            jwt_expiry_hours: 1,
        },
        ledger,
        admin_bootstrap: None,
    }
}

/// Resources over a fresh in-memory database with default ledger policy
pub async fn create_test_resources() -> Result<Arc<ServerResources>> {
    create_test_resources_with(LedgerConfig::default()).await
}

/// Resources over a fresh in-memory database with a custom ledger policy
pub async fn create_test_resources_with(ledger: LedgerConfig) -> Result<Arc<ServerResources>> {
    init_test_logging();
    let database = Database::in_memory().await?;
    let auth = AuthManager::new(TEST_JWT_SECRET.as_bytes(), 1).with_bcrypt_cost(4);
    Ok(Arc::new(ServerResources::new(database, auth, test_config(ledger))?))
}

/// Resources over a file-backed database in `dir` with a pool of several connections
///
/// Unlike the in-memory fixture, concurrent writers here contend for the
/// `SQLite` write lock.
pub async fn create_file_resources(dir: &Path, ledger: LedgerConfig) -> Result<Arc<ServerResources>> {
    init_test_logging();
    let database_config = DatabaseConfig {
        url: DatabaseUrl::SQLite {
            path: dir.join("levelup.db"),
        },
        max_connections: 8,
        max_retries: 8,
    };
    let database = Database::connect(&database_config).await?;
    let auth = AuthManager::new(TEST_JWT_SECRET.as_bytes(), 1).with_bcrypt_cost(4);
    let config = ServerConfig {
        database: database_config,
        ..test_config(ledger)
    };
    Ok(Arc::new(ServerResources::new(database, auth, config)?))
}

/// Context for a session's account
pub fn context_of(session: &AuthSession) -> AccountContext {
    AccountContext::new(session.account.account_id, session.account.role)
}

/// Register a member, optionally into a gym
pub async fn register_member(
    resources: &ServerResources,
    name: &str,
    gym_id: Option<Uuid>,
) -> Result<AuthSession> {
    Ok(resources
        .accounts
        .register_user(RegisterMember {
            username: name.to_owned(),
            email: format!("{name}@example.com"),
            password: TEST_PASSWORD.to_owned(),
            gym_id,
        })
        .await?)
}

/// Register a gym owner with a gym named after them
pub async fn register_owner(resources: &ServerResources, name: &str) -> Result<(AuthSession, Gym)> {
    Ok(resources
        .accounts
        .register_gym_owner(RegisterGymOwner {
            username: name.to_owned(),
            email: format!("{name}@example.com"),
            password: TEST_PASSWORD.to_owned(),
            gym_name: format!("{name}'s Gym"),
            address: None,
        })
        .await?)
}

/// Create an administrator and return its context
pub async fn create_admin(resources: &ServerResources) -> Result<AccountContext> {
    let admin = resources
        .accounts
        .ensure_admin("admin", "admin@example.com", TEST_PASSWORD)
        .await?;
    Ok(AccountContext::new(admin.id, Role::Admin))
}

/// Overwrite an account's balance, keeping the level consistent
pub async fn set_points(resources: &ServerResources, account_id: Uuid, points: i64) -> Result<()> {
    sqlx::query("UPDATE accounts SET points = $1, level = ($1 / $2) + 1 WHERE id = $3")
        .bind(points)
        .bind(POINTS_PER_LEVEL)
        .bind(account_id.to_string())
        .execute(resources.database.pool())
        .await?;
    Ok(())
}

/// Overwrite an account's quest streak
pub async fn set_streak(resources: &ServerResources, account_id: Uuid, streak: i64) -> Result<()> {
    sqlx::query("UPDATE accounts SET streak = $1 WHERE id = $2")
        .bind(streak)
        .bind(account_id.to_string())
        .execute(resources.database.pool())
        .await?;
    Ok(())
}

/// Change an account's tier directly in storage
pub async fn set_tier(
    resources: &ServerResources,
    account_id: Uuid,
    tier: SubscriptionTier,
) -> Result<()> {
    resources
        .database
        .accounts()
        .update_subscription(account_id, tier)
        .await?;
    Ok(())
}

/// A gold member holding `points`
pub async fn gold_member_with_points(
    resources: &ServerResources,
    name: &str,
    points: i64,
) -> Result<AccountContext> {
    let session = register_member(resources, name, None).await?;
    let ctx = context_of(&session);
    set_tier(resources, ctx.account_id, SubscriptionTier::Gold).await?;
    set_points(resources, ctx.account_id, points).await?;
    Ok(ctx)
}
