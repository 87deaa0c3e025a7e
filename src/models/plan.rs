// ABOUTME: Per-day workout and diet plans assigned to members
// ABOUTME: Plans are authored manually or generated, keyed by member and date
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::plans::ParsedExercise;

/// How a plan was produced
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    /// Written by a coach
    #[default]
    Manual,
    /// Produced by the plan generator
    Generated,
}

impl PlanSource {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Generated => "generated",
        }
    }
}

impl Display for PlanSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "generated" => Ok(Self::Generated),
            _ => Err(AppError::invalid_input(format!("Invalid plan source: {s}"))),
        }
    }
}

/// Plan for one member on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPlan {
    /// Member the plan is for
    pub account_id: Uuid,
    /// Day the plan applies to
    pub plan_date: NaiveDate,
    /// Workout text, one `- ` bullet per exercise
    pub workout_plan: Option<String>,
    /// Diet text
    pub diet_plan: Option<String>,
    /// Authoring source
    pub source: PlanSource,
    /// Account that assigned the plan
    pub assigned_by: Uuid,
    /// Last write
    pub updated_at: DateTime<Utc>,
}

/// The caller's plan for today with its parsed quest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodaysPlan {
    /// Calendar day the lookup used
    pub date: NaiveDate,
    /// Assigned plan, if any
    pub plan: Option<DailyPlan>,
    /// Exercises parsed from the workout text
    pub exercises: Vec<ParsedExercise>,
    /// Points available for completing every exercise
    pub total_points: i64,
}
