// ABOUTME: Application constants for progression rules, redemption thresholds and env defaults
// ABOUTME: Central place for the numbers that define levels, awards and the payout conversion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants shared across the ledger, the redemption workflow and configuration.

/// Service identity used in logs and health responses
pub mod service {
    /// Service name reported in logs and health checks
    pub const SERVICE_NAME: &str = "level-up-fitness";
    /// Crate version baked in at compile time
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Progression and redemption rules
pub mod ledger {
    /// Points required to advance one level
    pub const POINTS_PER_LEVEL: i64 = 100;
    /// Flat award for logging the day's diet
    pub const DIET_LOG_BONUS: i64 = 10;
    /// Largest award a single quest completion may carry
    pub const MAX_QUEST_POINTS: i64 = 10_000;
    /// Smallest amount a single redemption request may claim
    pub const MINIMUM_REDEEM_POINTS: i64 = 5000;
    /// Points per currency unit when presenting payouts
    pub const POINTS_PER_CURRENCY_UNIT: i64 = 100;
    /// Goal assigned to newly registered members
    pub const DEFAULT_MEMBER_GOAL: &str = "Not Set";
    /// Goal assigned to newly registered gym owners
    pub const DEFAULT_OWNER_GOAL: &str = "Manage Gym";
    /// Goals a member may pick once their goal is still unset
    pub const MEMBER_GOALS: [&str; 5] = [
        "Build Muscle",
        "Lose Weight",
        "Improve Endurance",
        "Increase Strength",
        "General Fitness",
    ];
    /// Leaderboard size when the caller does not ask for one
    pub const DEFAULT_LEADERBOARD_SIZE: i64 = 3;
    /// Largest leaderboard a caller may request
    pub const MAX_LEADERBOARD_SIZE: i64 = 50;
}

/// Workout plan parsing defaults
pub mod plans {
    /// Points for an exercise line without a `[Npts]` tag
    pub const DEFAULT_EXERCISE_POINTS: i64 = 10;
    /// Sets for an exercise line without an `Nx` token
    pub const DEFAULT_SETS: u32 = 3;
    /// Plan dates are stored and addressed in this format
    pub const PLAN_DATE_FORMAT: &str = "%Y-%m-%d";
}

/// Environment-driven defaults
pub mod env_config {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8080;
    /// Default database location
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/levelup.db";
    /// Default pool size for file-backed databases
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    /// Default attempts for lock-contention retries
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Default token lifetime
    pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;
    /// Minimum accepted length for a configured JWT secret
    pub const MIN_JWT_SECRET_LEN: usize = 32;
    /// Minimum accepted password length
    pub const MIN_PASSWORD_LEN: usize = 6;
}
