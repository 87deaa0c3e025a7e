// ABOUTME: Domain models for accounts, gyms, history records, redemptions and plans
// ABOUTME: Re-exports every model so callers can import from crate::models directly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain models

/// Accounts, roles, tiers and snapshots
pub mod account;
/// Gyms and gym summaries
pub mod gym;
/// Workout, diet and weight history
pub mod history;
/// Daily plans
pub mod plan;
/// Redemption requests and personal redemption history
pub mod redemption;

pub use account::{
    Account, AccountSnapshot, LeaderboardEntry, MemberProgress, Role, SubscriptionTier,
};
pub use gym::{Gym, GymSummary};
pub use history::{DailyCompletion, DietLog, MealEntries, WeightSample};
pub use plan::{DailyPlan, PlanSource, TodaysPlan};
pub use redemption::{
    RedemptionDecision, RedemptionHistoryEntry, RedemptionRequest, RedemptionStatus,
};
