// ABOUTME: Per-day plan storage keyed by member and date
// ABOUTME: Assigning a plan for a date that already has one replaces it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::rows::{encode_day, encode_timestamp, parse_day, parse_enum, parse_timestamp, parse_uuid};
use crate::errors::AppResult;
use crate::models::DailyPlan;

/// Plan database operations manager
pub struct PlanManager {
    pool: SqlitePool,
}

impl PlanManager {
    /// Create a new plan manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the plan for `plan.account_id` on `plan.plan_date`
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn upsert_plan(&self, plan: &DailyPlan) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO plans (account_id, plan_date, workout_plan, diet_plan, source, assigned_by, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(account_id, plan_date) DO UPDATE SET
                workout_plan = excluded.workout_plan,
                diet_plan = excluded.diet_plan,
                source = excluded.source,
                assigned_by = excluded.assigned_by,
                updated_at = excluded.updated_at
            ",
        )
        .bind(plan.account_id.to_string())
        .bind(encode_day(plan.plan_date))
        .bind(plan.workout_plan.as_deref())
        .bind(plan.diet_plan.as_deref())
        .bind(plan.source.as_str())
        .bind(plan.assigned_by.to_string())
        .bind(encode_timestamp(plan.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Plan for a member on a date
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_plan(&self, account_id: Uuid, date: NaiveDate) -> AppResult<Option<DailyPlan>> {
        sqlx::query(
            r"
            SELECT account_id, plan_date, workout_plan, diet_plan, source, assigned_by, updated_at
            FROM plans WHERE account_id = $1 AND plan_date = $2
            ",
        )
        .bind(account_id.to_string())
        .bind(encode_day(date))
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(row_to_plan)
        .transpose()
    }
}

fn row_to_plan(row: &SqliteRow) -> AppResult<DailyPlan> {
    let account_id: String = row.get("account_id");
    let plan_date: String = row.get("plan_date");
    let source: String = row.get("source");
    let assigned_by: String = row.get("assigned_by");
    let updated_at: String = row.get("updated_at");

    Ok(DailyPlan {
        account_id: parse_uuid(&account_id)?,
        plan_date: parse_day(&plan_date)?,
        workout_plan: row.get("workout_plan"),
        diet_plan: row.get("diet_plan"),
        source: parse_enum(&source)?,
        assigned_by: parse_uuid(&assigned_by)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
