// ABOUTME: Progression ledger storage: quest awards, diet logs and weight samples
// ABOUTME: Awards update points, level and streak and insert the day record in one transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::accounts::require_account_in;
use super::rows::{encode_day, encode_timestamp, parse_day, parse_timestamp, parse_uuid};
use super::transactions::TransactionGuard;
use crate::constants::ledger::{DIET_LOG_BONUS, POINTS_PER_LEVEL};
use crate::errors::{AppError, AppResult};
use crate::models::{Account, DailyCompletion, DietLog, MealEntries, WeightSample};
use crate::progression::previous_day;

/// How a quest completion moves the streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakPolicy {
    /// Every completion adds one
    Cumulative,
    /// A completion adds one only if the previous day was completed, else restarts at 1
    ResetOnMissedDay,
}

/// Progression ledger database operations manager
pub struct LedgerManager {
    pool: SqlitePool,
}

impl LedgerManager {
    /// Create a new ledger manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Quest completion
    // ========================================================================

    /// Credit a quest completion and record the day
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCompleted` if `day` already has a completion record and
    /// `ResourceNotFound` if the account does not exist. Either way nothing
    /// is written.
    pub async fn award_quest(
        &self,
        account_id: Uuid,
        day: NaiveDate,
        exercises: &[String],
        points: i64,
        now: DateTime<Utc>,
        policy: StreakPolicy,
    ) -> AppResult<Account> {
        let exercises_json = serde_json::to_string(exercises)
            .map_err(|e| AppError::internal(format!("Failed to encode exercises: {e}")))?;
        let reset_on_miss = i64::from(policy == StreakPolicy::ResetOnMissedDay);

        let mut guard = TransactionGuard::new(self.pool.begin().await?);

        let updated = sqlx::query(
            r"
            UPDATE accounts
            SET points = points + $1,
                level = ((points + $1) / $2) + 1,
                streak = CASE WHEN $3 = 0 OR last_quest_day = $4 THEN streak + 1 ELSE 1 END,
                last_completed_quest_at = $5,
                last_quest_day = $6
            WHERE id = $7
            ",
        )
        .bind(points)
        .bind(POINTS_PER_LEVEL)
        .bind(reset_on_miss)
        .bind(encode_day(previous_day(day)))
        .bind(encode_timestamp(now))
        .bind(encode_day(day))
        .bind(account_id.to_string())
        .execute(guard.executor()?)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Account {account_id}")));
        }

        let inserted = sqlx::query(
            r"
            INSERT INTO daily_completions (account_id, day_key, exercises, points_awarded, completed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT(account_id, day_key) DO NOTHING
            ",
        )
        .bind(account_id.to_string())
        .bind(encode_day(day))
        .bind(exercises_json)
        .bind(points)
        .bind(encode_timestamp(now))
        .execute(guard.executor()?)
        .await?;
        if inserted.rows_affected() == 0 {
            debug!(account.id = %account_id, day = %day, "Quest already completed, rolling back");
            guard.rollback().await?;
            return Err(AppError::already_completed());
        }

        let account = require_account_in(guard.executor()?, account_id).await?;
        guard.commit().await?;
        Ok(account)
    }

    /// Completion record for a day
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_completion(
        &self,
        account_id: Uuid,
        day: NaiveDate,
    ) -> AppResult<Option<DailyCompletion>> {
        sqlx::query(
            r"
            SELECT account_id, day_key, exercises, points_awarded, completed_at
            FROM daily_completions WHERE account_id = $1 AND day_key = $2
            ",
        )
        .bind(account_id.to_string())
        .bind(encode_day(day))
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(row_to_completion)
        .transpose()
    }

    /// Workout history, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_completions(&self, account_id: Uuid) -> AppResult<Vec<DailyCompletion>> {
        sqlx::query(
            r"
            SELECT account_id, day_key, exercises, points_awarded, completed_at
            FROM daily_completions WHERE account_id = $1
            ORDER BY day_key DESC
            ",
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(row_to_completion)
        .collect()
    }

    // ========================================================================
    // Diet logging
    // ========================================================================

    /// Store the day's diet log and credit the logging bonus
    ///
    /// # Errors
    ///
    /// Returns `AlreadyLogged` if `day` already has a diet log and
    /// `ResourceNotFound` if the account does not exist
    pub async fn log_diet(
        &self,
        account_id: Uuid,
        day: NaiveDate,
        meals: &MealEntries,
        now: DateTime<Utc>,
    ) -> AppResult<Account> {
        let mut guard = TransactionGuard::new(self.pool.begin().await?);

        let updated = sqlx::query(
            r"
            UPDATE accounts
            SET points = points + $1,
                level = ((points + $1) / $2) + 1,
                last_logged_diet_at = $3
            WHERE id = $4
            ",
        )
        .bind(DIET_LOG_BONUS)
        .bind(POINTS_PER_LEVEL)
        .bind(encode_timestamp(now))
        .bind(account_id.to_string())
        .execute(guard.executor()?)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Account {account_id}")));
        }

        let inserted = sqlx::query(
            r"
            INSERT INTO diet_logs (account_id, day_key, morning, lunch, dinner, snacks, logged_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(account_id, day_key) DO NOTHING
            ",
        )
        .bind(account_id.to_string())
        .bind(encode_day(day))
        .bind(&meals.morning)
        .bind(&meals.lunch)
        .bind(&meals.dinner)
        .bind(&meals.snacks)
        .bind(encode_timestamp(now))
        .execute(guard.executor()?)
        .await?;
        if inserted.rows_affected() == 0 {
            guard.rollback().await?;
            return Err(AppError::already_logged());
        }

        let account = require_account_in(guard.executor()?, account_id).await?;
        guard.commit().await?;
        Ok(account)
    }

    /// Diet log for a day
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_diet_log(&self, account_id: Uuid, day: NaiveDate) -> AppResult<Option<DietLog>> {
        sqlx::query(
            r"
            SELECT account_id, day_key, morning, lunch, dinner, snacks, logged_at
            FROM diet_logs WHERE account_id = $1 AND day_key = $2
            ",
        )
        .bind(account_id.to_string())
        .bind(encode_day(day))
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(row_to_diet_log)
        .transpose()
    }

    /// Diet history, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_diet_logs(&self, account_id: Uuid) -> AppResult<Vec<DietLog>> {
        sqlx::query(
            r"
            SELECT account_id, day_key, morning, lunch, dinner, snacks, logged_at
            FROM diet_logs WHERE account_id = $1
            ORDER BY day_key DESC
            ",
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(row_to_diet_log)
        .collect()
    }

    // ========================================================================
    // Weight tracking
    // ========================================================================

    /// Append a weight sample
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn insert_weight(&self, sample: &WeightSample) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO weight_samples (id, account_id, weight_kg, recorded_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(sample.id.to_string())
        .bind(sample.account_id.to_string())
        .bind(sample.weight_kg)
        .bind(encode_timestamp(sample.recorded_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Weight history, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_weights(&self, account_id: Uuid) -> AppResult<Vec<WeightSample>> {
        let rows = sqlx::query(
            r"
            SELECT id, account_id, weight_kg, recorded_at
            FROM weight_samples WHERE account_id = $1
            ORDER BY recorded_at DESC
            ",
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let account_id: String = row.get("account_id");
                let recorded_at: String = row.get("recorded_at");
                Ok(WeightSample {
                    id: parse_uuid(&id)?,
                    account_id: parse_uuid(&account_id)?,
                    weight_kg: row.get("weight_kg"),
                    recorded_at: parse_timestamp(&recorded_at)?,
                })
            })
            .collect()
    }
}

fn row_to_completion(row: &SqliteRow) -> AppResult<DailyCompletion> {
    let account_id: String = row.get("account_id");
    let day_key: String = row.get("day_key");
    let exercises: String = row.get("exercises");
    let completed_at: String = row.get("completed_at");

    Ok(DailyCompletion {
        account_id: parse_uuid(&account_id)?,
        day: parse_day(&day_key)?,
        exercises: serde_json::from_str(&exercises)
            .map_err(|e| AppError::storage(format!("Invalid stored exercises: {e}")))?,
        points_awarded: row.get("points_awarded"),
        completed_at: parse_timestamp(&completed_at)?,
    })
}

fn row_to_diet_log(row: &SqliteRow) -> AppResult<DietLog> {
    let account_id: String = row.get("account_id");
    let day_key: String = row.get("day_key");
    let logged_at: String = row.get("logged_at");

    Ok(DietLog {
        account_id: parse_uuid(&account_id)?,
        day: parse_day(&day_key)?,
        meals: MealEntries {
            morning: row.get("morning"),
            lunch: row.get("lunch"),
            dinner: row.get("dinner"),
            snacks: row.get("snacks"),
        },
        logged_at: parse_timestamp(&logged_at)?,
    })
}
