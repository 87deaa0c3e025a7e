// ABOUTME: Progression ledger service awarding quest and diet points once per calendar day
// ABOUTME: Derives snapshots with level, class and today status and publishes them live
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::AccountContext;
use crate::config::LedgerConfig;
use crate::constants::ledger::MAX_QUEST_POINTS;
use crate::database::{retry_transaction, Database, StreakPolicy};
use crate::errors::{AppError, AppResult};
use crate::models::{
    Account, AccountSnapshot, DailyCompletion, DietLog, MealEntries, WeightSample,
};
use crate::notifications::AccountEvents;
use crate::permissions::{Capabilities, Operation};
use crate::progression;

/// Points, level and streak owner
#[derive(Clone)]
pub struct ProgressionLedger {
    database: Database,
    events: AccountEvents,
    offset: FixedOffset,
    streak_policy: StreakPolicy,
}

impl ProgressionLedger {
    /// Create the ledger service
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if the day offset is out of range
    pub fn new(database: Database, events: AccountEvents, config: &LedgerConfig) -> AppResult<Self> {
        Ok(Self {
            database,
            events,
            offset: config.day_offset()?,
            streak_policy: if config.streak_reset_on_missed_day {
                StreakPolicy::ResetOnMissedDay
            } else {
                StreakPolicy::Cumulative
            },
        })
    }

    /// Calendar day of `now` on the configured calendar
    #[must_use]
    pub fn day_key(&self, now: DateTime<Utc>) -> NaiveDate {
        progression::day_key(now, self.offset)
    }

    /// Offset defining the calendar day boundary
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Snapshot of an account as of `now`
    #[must_use]
    pub fn snapshot_of(&self, account: &Account, now: DateTime<Utc>) -> AccountSnapshot {
        AccountSnapshot::from_account(account, now, self.offset)
    }

    /// Publish the current state of an account to live subscribers
    pub async fn publish(&self, account: &Account, now: DateTime<Utc>) {
        self.events.publish(&self.snapshot_of(account, now)).await;
    }

    // ========================================================================
    // Quest completion
    // ========================================================================

    /// Award today's quest
    ///
    /// # Errors
    ///
    /// See [`Self::complete_quest_at`]
    pub async fn complete_quest(
        &self,
        ctx: &AccountContext,
        exercises: Vec<String>,
        points_earned: i64,
    ) -> AppResult<AccountSnapshot> {
        self.complete_quest_at(ctx, exercises, points_earned, Utc::now())
            .await
    }

    /// Award the quest for the calendar day containing `now`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a negative or oversized award,
    /// `AlreadyCompleted` if the day already has a completion, and
    /// `PermissionDenied` for non-member roles
    #[instrument(skip(self, exercises), fields(account.id = %ctx.account_id))]
    pub async fn complete_quest_at(
        &self,
        ctx: &AccountContext,
        exercises: Vec<String>,
        points_earned: i64,
        now: DateTime<Utc>,
    ) -> AppResult<AccountSnapshot> {
        Capabilities::require_role(ctx.role, Operation::CompleteQuest)?;
        if points_earned < 0 {
            return Err(AppError::invalid_input("Points earned cannot be negative"));
        }
        if points_earned > MAX_QUEST_POINTS {
            return Err(AppError::invalid_input(format!(
                "Points earned cannot exceed {MAX_QUEST_POINTS}"
            )));
        }

        let exercises: Vec<String> = exercises
            .into_iter()
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .collect();
        let day = self.day_key(now);
        let ledger = self.database.ledger();
        let policy = self.streak_policy;

        let account = retry_transaction(
            || ledger.award_quest(ctx.account_id, day, &exercises, points_earned, now, policy),
            self.database.max_retries(),
        )
        .await?;

        info!(
            account.id = %account.id,
            points = points_earned,
            balance = account.points,
            level = account.level,
            streak = account.streak,
            "Daily quest completed"
        );
        let snapshot = self.snapshot_of(&account, now);
        self.events.publish(&snapshot).await;
        Ok(snapshot)
    }

    // ========================================================================
    // Diet and weight
    // ========================================================================

    /// Log today's diet
    ///
    /// # Errors
    ///
    /// See [`Self::log_diet_at`]
    pub async fn log_diet(&self, ctx: &AccountContext, meals: MealEntries) -> AppResult<AccountSnapshot> {
        self.log_diet_at(ctx, meals, Utc::now()).await
    }

    /// Log the diet for the calendar day containing `now` and credit the bonus
    ///
    /// # Errors
    ///
    /// Returns `AlreadyLogged` if the day already has a diet log and
    /// `PermissionDenied` for non-member roles
    #[instrument(skip(self, meals), fields(account.id = %ctx.account_id))]
    pub async fn log_diet_at(
        &self,
        ctx: &AccountContext,
        meals: MealEntries,
        now: DateTime<Utc>,
    ) -> AppResult<AccountSnapshot> {
        Capabilities::require_role(ctx.role, Operation::LogDiet)?;
        let meals = MealEntries {
            morning: meals.morning.trim().to_owned(),
            lunch: meals.lunch.trim().to_owned(),
            dinner: meals.dinner.trim().to_owned(),
            snacks: meals.snacks.trim().to_owned(),
        };
        let day = self.day_key(now);
        let ledger = self.database.ledger();

        let account = retry_transaction(
            || ledger.log_diet(ctx.account_id, day, &meals, now),
            self.database.max_retries(),
        )
        .await?;

        info!(account.id = %account.id, balance = account.points, "Diet logged");
        let snapshot = self.snapshot_of(&account, now);
        self.events.publish(&snapshot).await;
        Ok(snapshot)
    }

    /// Record a weight sample now
    ///
    /// # Errors
    ///
    /// See [`Self::log_weight_at`]
    pub async fn log_weight(&self, ctx: &AccountContext, weight_kg: f64) -> AppResult<WeightSample> {
        self.log_weight_at(ctx, weight_kg, Utc::now()).await
    }

    /// Record a weight sample at `now`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` unless the weight is finite and positive
    pub async fn log_weight_at(
        &self,
        ctx: &AccountContext,
        weight_kg: f64,
        now: DateTime<Utc>,
    ) -> AppResult<WeightSample> {
        Capabilities::require_role(ctx.role, Operation::LogWeight)?;
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(AppError::invalid_input(
                "Weight must be a positive number of kilograms",
            ));
        }
        self.database.accounts().require_account(ctx.account_id).await?;

        let sample = WeightSample {
            id: Uuid::new_v4(),
            account_id: ctx.account_id,
            weight_kg,
            recorded_at: now,
        };
        self.database.ledger().insert_weight(&sample).await?;
        info!(account.id = %ctx.account_id, weight_kg = weight_kg, "Weight recorded");
        Ok(sample)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// The caller's current snapshot
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the account no longer exists
    pub async fn snapshot(&self, ctx: &AccountContext) -> AppResult<AccountSnapshot> {
        self.snapshot_at(ctx, Utc::now()).await
    }

    /// The caller's snapshot as of `now`
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the account no longer exists
    pub async fn snapshot_at(
        &self,
        ctx: &AccountContext,
        now: DateTime<Utc>,
    ) -> AppResult<AccountSnapshot> {
        let account = self.database.accounts().require_account(ctx.account_id).await?;
        Ok(self.snapshot_of(&account, now))
    }

    /// Whether the caller completed the quest on the day containing `now`
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the account no longer exists
    pub async fn has_completed_quest_today(
        &self,
        ctx: &AccountContext,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.snapshot_at(ctx, now).await?.has_completed_quest_today)
    }

    /// Whether the caller logged diet on the day containing `now`
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the account no longer exists
    pub async fn has_logged_diet_today(
        &self,
        ctx: &AccountContext,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.snapshot_at(ctx, now).await?.has_logged_diet_today)
    }

    /// The caller's workout history, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn workout_history(&self, ctx: &AccountContext) -> AppResult<Vec<DailyCompletion>> {
        self.database.ledger().list_completions(ctx.account_id).await
    }

    /// The caller's diet history, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn diet_history(&self, ctx: &AccountContext) -> AppResult<Vec<DietLog>> {
        self.database.ledger().list_diet_logs(ctx.account_id).await
    }

    /// The caller's weight history, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn weight_history(&self, ctx: &AccountContext) -> AppResult<Vec<WeightSample>> {
        self.database.ledger().list_weights(ctx.account_id).await
    }
}
