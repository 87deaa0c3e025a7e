// ABOUTME: Workout completion records, diet logs and weight samples
// ABOUTME: Day-keyed records enforce the one-award-per-day rule in storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workout history record, one per account per calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCompletion {
    /// Owner
    pub account_id: Uuid,
    /// Calendar day of the completion
    pub day: NaiveDate,
    /// Names of the exercises completed
    pub exercises: Vec<String>,
    /// Points credited for the quest
    pub points_awarded: i64,
    /// Completion instant
    pub completed_at: DateTime<Utc>,
}

/// Meals of one day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealEntries {
    /// Breakfast
    pub morning: String,
    /// Lunch
    pub lunch: String,
    /// Dinner
    pub dinner: String,
    /// Anything in between
    pub snacks: String,
}

impl MealEntries {
    /// True when no meal has any text
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.morning, &self.lunch, &self.dinner, &self.snacks]
            .iter()
            .all(|meal| meal.trim().is_empty())
    }
}

/// Diet log, one per account per calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietLog {
    /// Owner
    pub account_id: Uuid,
    /// Calendar day of the log
    pub day: NaiveDate,
    /// Logged meals
    pub meals: MealEntries,
    /// Log instant
    pub logged_at: DateTime<Utc>,
}

/// Body weight measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSample {
    /// Sample id
    pub id: Uuid,
    /// Owner
    pub account_id: Uuid,
    /// Weight in kilograms
    pub weight_kg: f64,
    /// Measurement instant
    pub recorded_at: DateTime<Utc>,
}
