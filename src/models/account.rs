// ABOUTME: Account model with role, subscription tier and progression fields
// ABOUTME: Also defines the derived AccountSnapshot published to clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::history::{DailyCompletion, DietLog, WeightSample};
use super::redemption::RedemptionHistoryEntry;
use crate::errors::AppError;
use crate::progression::{classify, currency_value, is_same_day, HunterClass};

/// Account role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Gym member
    User,
    /// Platform administrator
    Admin,
    /// Owner of exactly one gym
    GymOwner,
}

impl Role {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::GymOwner => "gym-owner",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "gym-owner" => Ok(Self::GymOwner),
            _ => Err(AppError::invalid_input(format!("Invalid role: {s}"))),
        }
    }
}

/// Subscription tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SubscriptionTier {
    /// Free member plan
    Bronze,
    /// Paid member plan
    Silver,
    /// Top member plan, includes redemption
    Gold,
    /// Free gym owner plan
    GymFree,
    /// Paid gym owner plan, includes generated plans
    GymPrime,
}

impl SubscriptionTier {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::GymFree => "gym-free",
            Self::GymPrime => "gym-prime",
        }
    }

    /// Get display name for this tier
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::GymFree => "Gym Free",
            Self::GymPrime => "Gym Prime",
        }
    }

    /// Tier assigned at registration
    #[must_use]
    pub const fn default_for(role: Role) -> Self {
        match role {
            Role::User | Role::Admin => Self::Bronze,
            Role::GymOwner => Self::GymFree,
        }
    }

    /// Whether the tier belongs to the plan family offered to `role`
    #[must_use]
    pub const fn available_to(self, role: Role) -> bool {
        match role {
            Role::GymOwner => matches!(self, Self::GymFree | Self::GymPrime),
            Role::User | Role::Admin => matches!(self, Self::Bronze | Self::Silver | Self::Gold),
        }
    }
}

impl Display for SubscriptionTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bronze" => Ok(Self::Bronze),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            "gym-free" => Ok(Self::GymFree),
            "gym-prime" => Ok(Self::GymPrime),
            _ => Err(AppError::invalid_input(format!(
                "Invalid subscription tier: {s}"
            ))),
        }
    }
}

/// Stored account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account id
    pub id: Uuid,
    /// Display name
    pub username: String,
    /// Login email, unique
    pub email: String,
    /// bcrypt hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Free-text fitness goal
    pub goal: String,
    /// Gym the account belongs to
    pub gym_id: Option<Uuid>,
    /// Role
    pub role: Role,
    /// Subscription tier
    pub subscription_tier: SubscriptionTier,
    /// Point balance
    pub points: i64,
    /// Level, always `points / 100 + 1`
    pub level: i64,
    /// Completed quest streak
    pub streak: i64,
    /// Last quest completion
    pub last_completed_quest_at: Option<DateTime<Utc>>,
    /// Last diet log
    pub last_logged_diet_at: Option<DateTime<Utc>>,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

/// Client-facing view of an account's progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Account id
    pub account_id: Uuid,
    /// Display name
    pub username: String,
    /// Login email
    pub email: String,
    /// Fitness goal
    pub goal: String,
    /// Gym membership
    pub gym_id: Option<Uuid>,
    /// Role
    pub role: Role,
    /// Subscription tier
    pub subscription_tier: SubscriptionTier,
    /// Point balance
    pub points: i64,
    /// Level
    pub level: i64,
    /// Hunter class for the level
    pub hunter_class: HunterClass,
    /// Quest streak
    pub streak: i64,
    /// Last quest completion
    pub last_completed_quest_at: Option<DateTime<Utc>>,
    /// Last diet log
    pub last_logged_diet_at: Option<DateTime<Utc>>,
    /// Whether today's quest is done
    pub has_completed_quest_today: bool,
    /// Whether today's diet is logged
    pub has_logged_diet_today: bool,
    /// Currency value of the balance, display only
    pub redeemable_value: f64,
}

impl AccountSnapshot {
    /// Derive the snapshot as seen at `now` on the configured calendar
    #[must_use]
    pub fn from_account(account: &Account, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            account_id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            goal: account.goal.clone(),
            gym_id: account.gym_id,
            role: account.role,
            subscription_tier: account.subscription_tier,
            points: account.points,
            level: account.level,
            hunter_class: classify(account.level),
            streak: account.streak,
            last_completed_quest_at: account.last_completed_quest_at,
            last_logged_diet_at: account.last_logged_diet_at,
            has_completed_quest_today: is_same_day(account.last_completed_quest_at, now, offset),
            has_logged_diet_today: is_same_day(account.last_logged_diet_at, now, offset),
            redeemable_value: currency_value(account.points),
        }
    }
}

/// One row of the streak leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Account id
    pub account_id: Uuid,
    /// Display name
    pub username: String,
    /// Quest streak
    pub streak: i64,
}

/// Everything a gym owner or administrator sees about one member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberProgress {
    /// Current state
    pub account: AccountSnapshot,
    /// Workout history, newest first
    pub workouts: Vec<DailyCompletion>,
    /// Diet history, newest first
    pub diet: Vec<DietLog>,
    /// Weight history, newest first
    pub weights: Vec<WeightSample>,
    /// Redemption history, newest first
    pub redemptions: Vec<RedemptionHistoryEntry>,
}
