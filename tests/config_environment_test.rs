// ABOUTME: Tests for environment-driven configuration and file-backed storage
// ABOUTME: Env-var tests run serially since the process environment is shared
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::env;

use anyhow::Result;
use level_up_fitness::{
    config::{AdminBootstrap, DatabaseConfig, DatabaseUrl, Environment, LedgerConfig, ServerConfig},
    database::Database,
    errors::ErrorCode,
};
use serial_test::serial;

const LEDGER_VARS: [&str; 3] = [
    "LEDGER_DAY_OFFSET_MINUTES",
    "REDEMPTION_REFUND_ON_REJECT",
    "STREAK_RESET_ON_MISSED_DAY",
];

fn clear(vars: &[&str]) {
    for var in vars {
        env::remove_var(var);
    }
}

#[test]
fn test_database_url_parsing() {
    assert_eq!(DatabaseUrl::parse_url("sqlite::memory:").unwrap(), DatabaseUrl::Memory);
    assert!(!DatabaseUrl::parse_url("sqlite:./data/levelup.db").unwrap().is_memory());
    assert!(DatabaseUrl::parse_url("postgres://localhost/levelup").is_err());
    assert!(DatabaseUrl::parse_url("").is_err());
}

#[test]
#[serial]
fn test_ledger_defaults() {
    clear(&LEDGER_VARS);
    let config = LedgerConfig::from_env().unwrap();
    assert_eq!(config, LedgerConfig::default());
    assert!(!config.refund_on_reject);
    assert!(!config.streak_reset_on_missed_day);
}

#[test]
#[serial]
fn test_ledger_overrides_and_rejections() {
    clear(&LEDGER_VARS);
    env::set_var("LEDGER_DAY_OFFSET_MINUTES", "330");
    env::set_var("REDEMPTION_REFUND_ON_REJECT", "true");
    env::set_var("STREAK_RESET_ON_MISSED_DAY", "true");
    let config = LedgerConfig::from_env().unwrap();
    assert_eq!(config.day_offset_minutes, 330);
    assert!(config.refund_on_reject);
    assert!(config.streak_reset_on_missed_day);

    env::set_var("LEDGER_DAY_OFFSET_MINUTES", "900");
    assert_eq!(
        LedgerConfig::from_env().unwrap_err().code,
        ErrorCode::ConfigInvalid
    );

    env::set_var("LEDGER_DAY_OFFSET_MINUTES", "soon");
    assert_eq!(
        LedgerConfig::from_env().unwrap_err().code,
        ErrorCode::ConfigInvalid
    );
    clear(&LEDGER_VARS);
}

#[test]
#[serial]
fn test_production_requires_jwt_secret() {
    clear(&["JWT_SECRET", "JWT_EXPIRY_HOURS"]);
    let err = level_up_fitness::config::AuthConfig::from_env(Environment::Production).unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigError);

    let dev = level_up_fitness::config::AuthConfig::from_env(Environment::Development).unwrap();
    assert_eq!(dev.jwt_secret.len(), 64);

    env::set_var("JWT_SECRET", "too-short");
    assert!(level_up_fitness::config::AuthConfig::from_env(Environment::Development).is_err());
    env::remove_var("JWT_SECRET");
}

#[test]
#[serial]
fn test_admin_bootstrap_needs_email_and_password() {
    clear(&["ADMIN_EMAIL", "ADMIN_PASSWORD", "ADMIN_USERNAME"]);
    assert!(AdminBootstrap::from_env().is_none());

    env::set_var("ADMIN_EMAIL", "admin@levelup.fit");
    assert!(AdminBootstrap::from_env().is_none());

    env::set_var("ADMIN_PASSWORD", "change-me-now");
    let admin = AdminBootstrap::from_env().unwrap();
    assert_eq!(admin.username, "admin");
    assert_eq!(admin.email, "admin@levelup.fit");
    clear(&["ADMIN_EMAIL", "ADMIN_PASSWORD"]);
}

#[test]
#[serial]
fn test_server_config_summary_hides_secrets() {
    clear(&LEDGER_VARS);
    env::set_var("JWT_SECRET", "a-long-enough-secret-for-the-summary-test");
    env::set_var("DATABASE_URL", "sqlite::memory:");
    env::set_var("HTTP_PORT", "9090");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.http_port, 9090);
    assert!(config.database.url.is_memory());
    let summary = config.summary();
    assert!(summary.contains("9090"));
    assert!(!summary.contains("a-long-enough-secret"));

    clear(&["JWT_SECRET", "DATABASE_URL", "HTTP_PORT"]);
}

#[tokio::test]
async fn test_file_database_persists_across_connections() -> Result<()> {
    common::init_test_logging();
    let dir = tempfile::tempdir()?;
    let config = DatabaseConfig {
        url: DatabaseUrl::SQLite {
            path: dir.path().join("levelup.db"),
        },
        ..DatabaseConfig::default()
    };

    let database = Database::connect(&config).await?;
    let account = database
        .accounts()
        .create_account(
            level_up_fitness::database::NewAccount {
                username: "jinwoo".to_owned(),
                email: "jinwoo@example.com".to_owned(),
                password_hash: "hash".to_owned(),
                goal: "Not Set".to_owned(),
                gym_id: None,
                role: level_up_fitness::models::Role::User,
                subscription_tier: level_up_fitness::models::SubscriptionTier::Bronze,
            },
            chrono::Utc::now(),
        )
        .await?;
    database.close().await;

    let reopened = Database::connect(&config).await?;
    let loaded = reopened.accounts().require_account(account.id).await?;
    assert_eq!(loaded.email, "jinwoo@example.com");
    reopened.close().await;
    Ok(())
}
