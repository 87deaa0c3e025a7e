// ABOUTME: SQLite connection pool, schema migrations and per-concern storage managers
// ABOUTME: All ledger state lives here and every mutation runs inside one transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database
//!
//! [`Database`] owns the `SqlitePool` and hands out managers that wrap a clone
//! of it, one per concern: accounts and gyms, the progression ledger,
//! redemptions and plans.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, AppResult};

/// Account and gym storage
pub mod accounts;
/// Quest, diet and weight storage
pub mod ledger;
/// Per-day plan storage
pub mod plans;
/// Redemption request storage
pub mod redemptions;
/// Row decoding helpers
mod rows;
/// Transaction guard and retry helpers
pub mod transactions;

pub use accounts::{AccountManager, NewAccount};
pub use ledger::{LedgerManager, StreakPolicy};
pub use plans::PlanManager;
pub use redemptions::{RedemptionManager, ResolvedRedemption};
pub use transactions::{retry_transaction, TransactionGuard};

/// Database handle
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    max_retries: u32,
}

impl Database {
    /// Connect and run migrations
    ///
    /// In-memory databases are pinned to a single long-lived connection since
    /// every `SQLite` memory connection is a separate database.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the pool cannot be opened or migrated
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let url = config.url.to_connection_string();
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| AppError::config_invalid(format!("Invalid DATABASE_URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(30));
        pool_options = if config.url.is_memory() {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        info!(
            database.url = %config.url,
            pool.max_connections = pool.options().get_max_connections(),
            "Connected to database"
        );

        let database = Self {
            pool,
            max_retries: config.max_retries,
        };
        database.migrate().await?;
        Ok(database)
    }

    /// Open an in-memory database for tests and local runs
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the pool cannot be opened or migrated
    pub async fn in_memory() -> AppResult<Self> {
        Self::connect(&DatabaseConfig::memory()).await
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Attempts for lock-contention retries
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Account and gym manager
    #[must_use]
    pub fn accounts(&self) -> AccountManager {
        AccountManager::new(self.pool.clone())
    }

    /// Progression ledger manager
    #[must_use]
    pub fn ledger(&self) -> LedgerManager {
        LedgerManager::new(self.pool.clone())
    }

    /// Redemption manager
    #[must_use]
    pub fn redemptions(&self) -> RedemptionManager {
        RedemptionManager::new(self.pool.clone())
    }

    /// Plan manager
    #[must_use]
    pub fn plans(&self) -> PlanManager {
        PlanManager::new(self.pool.clone())
    }

    /// Cheap liveness check used by the readiness endpoint
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the database does not answer
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run schema migrations
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if any statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        info!("Running database migrations");
        self.create_accounts_tables().await?;
        self.create_ledger_tables().await?;
        self.create_redemption_tables().await?;
        self.create_plan_tables().await?;
        info!("Database migrations complete");
        Ok(())
    }

    async fn create_accounts_tables(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                goal TEXT NOT NULL,
                gym_id TEXT,
                role TEXT NOT NULL CHECK (role IN ('user', 'admin', 'gym-owner')),
                subscription_tier TEXT NOT NULL
                    CHECK (subscription_tier IN ('bronze', 'silver', 'gold', 'gym-free', 'gym-prime')),
                points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
                level INTEGER NOT NULL DEFAULT 1 CHECK (level >= 1),
                streak INTEGER NOT NULL DEFAULT 0 CHECK (streak >= 0),
                last_completed_quest_at TEXT,
                last_quest_day TEXT,
                last_logged_diet_at TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_accounts_gym ON accounts(gym_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS gyms (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                owner_id TEXT NOT NULL UNIQUE REFERENCES accounts(id) ON DELETE CASCADE,
                address TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_ledger_tables(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS daily_completions (
                account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                day_key TEXT NOT NULL,
                exercises TEXT NOT NULL,
                points_awarded INTEGER NOT NULL CHECK (points_awarded >= 0),
                completed_at TEXT NOT NULL,
                PRIMARY KEY (account_id, day_key)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS diet_logs (
                account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                day_key TEXT NOT NULL,
                morning TEXT NOT NULL DEFAULT '',
                lunch TEXT NOT NULL DEFAULT '',
                dinner TEXT NOT NULL DEFAULT '',
                snacks TEXT NOT NULL DEFAULT '',
                logged_at TEXT NOT NULL,
                PRIMARY KEY (account_id, day_key)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS weight_samples (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                weight_kg REAL NOT NULL CHECK (weight_kg > 0),
                recorded_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_weight_samples_account ON weight_samples(account_id, recorded_at)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_redemption_tables(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS redemption_requests (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                username TEXT NOT NULL,
                points_requested INTEGER NOT NULL CHECK (points_requested > 0),
                payout_destination TEXT NOT NULL,
                requested_at TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'approved', 'rejected')),
                resolved_at TEXT,
                resolved_by TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_redemption_requests_status ON redemption_requests(status, requested_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS redemption_history (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                request_id TEXT NOT NULL REFERENCES redemption_requests(id) ON DELETE CASCADE,
                points_redeemed INTEGER NOT NULL,
                redeemed_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_plan_tables(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS plans (
                account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                plan_date TEXT NOT NULL,
                workout_plan TEXT,
                diet_plan TEXT,
                source TEXT NOT NULL CHECK (source IN ('manual', 'generated')),
                assigned_by TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (account_id, plan_date)
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
