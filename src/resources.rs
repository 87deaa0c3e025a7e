// ABOUTME: Shared resource container handed to every route as axum state
// ABOUTME: Builds the database, token manager, event hub and domain services once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources
//!
// NOTE: `.clone()` calls here share pool handles and event channels between services.

use std::sync::Arc;

use tracing::info;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::AppResult;
use crate::notifications::AccountEvents;
use crate::services::{AccountService, PlanService, ProgressionLedger, RedemptionWorkflow};

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Storage handle
    pub database: Database,
    /// Token and password manager
    pub auth: Arc<AuthManager>,
    /// Live snapshot channels
    pub events: AccountEvents,
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    /// Quests, diet and weight
    pub ledger: ProgressionLedger,
    /// Redemption requests
    pub redemptions: RedemptionWorkflow,
    /// Accounts and gyms
    pub accounts: AccountService,
    /// Per-day plans
    pub plans: PlanService,
}

impl ServerResources {
    /// Connect to the configured database, migrate it and build every service
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or the ledger policy is invalid
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let database = Database::connect(&config.database).await?;
        let auth = AuthManager::from_config(&config.auth);
        Self::new(database, auth, config)
    }

    /// Assemble resources around an already migrated database
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if the ledger policy is invalid
    pub fn new(database: Database, auth: AuthManager, config: ServerConfig) -> AppResult<Self> {
        let auth = Arc::new(auth);
        let events = AccountEvents::default();

        let ledger = ProgressionLedger::new(database.clone(), events.clone(), &config.ledger)?;
        let redemptions = RedemptionWorkflow::new(database.clone(), events.clone(), &config.ledger)?;
        let accounts =
            AccountService::new(database.clone(), auth.clone(), events.clone(), &config.ledger)?;
        let plans = PlanService::new(database.clone(), &config.ledger)?;

        info!("Server resources initialized");
        Ok(Self {
            database,
            auth,
            events,
            config: Arc::new(config),
            ledger,
            redemptions,
            accounts,
            plans,
        })
    }

    /// Create the bootstrap administrator when one is configured
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be created
    pub async fn bootstrap_admin(&self) -> AppResult<()> {
        if let Some(admin) = &self.config.admin_bootstrap {
            self.accounts
                .ensure_admin(&admin.username, &admin.email, &admin.password)
                .await?;
        }
        Ok(())
    }
}
