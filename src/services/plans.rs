// ABOUTME: Plan assignment by administrators and gym owners, and today's plan for members
// ABOUTME: Today's plan carries the exercises parsed from the workout text and their points
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::authorize_member_access;
use crate::auth::AccountContext;
use crate::config::LedgerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{DailyPlan, PlanSource, Role, TodaysPlan};
use crate::permissions::{Capabilities, Operation};
use crate::plans::{parse_workout_plan, total_points};
use crate::progression;

/// Plan assignment input
#[derive(Debug, Clone, Deserialize)]
pub struct AssignPlan {
    /// Member receiving the plan
    pub member_id: Uuid,
    /// Day the plan applies to
    pub date: NaiveDate,
    /// Workout text
    #[serde(default)]
    pub workout_plan: Option<String>,
    /// Diet text
    #[serde(default)]
    pub diet_plan: Option<String>,
    /// Authoring source
    #[serde(default)]
    pub source: PlanSource,
}

/// Plan service
#[derive(Clone)]
pub struct PlanService {
    database: Database,
    offset: FixedOffset,
}

impl PlanService {
    /// Create the plan service
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if the day offset is out of range
    pub fn new(database: Database, config: &LedgerConfig) -> AppResult<Self> {
        Ok(Self {
            database,
            offset: config.day_offset()?,
        })
    }

    /// Assign or replace a member's plan for one day
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when the caller may not manage the member,
    /// `TierRestricted` for generated plans off the gym-prime plan and
    /// `InvalidInput` when both texts are blank or the target is not a member
    pub async fn assign_plan(&self, ctx: &AccountContext, input: AssignPlan) -> AppResult<DailyPlan> {
        Capabilities::require_role(ctx.role, Operation::AssignPlan)?;
        let accounts = self.database.accounts();
        if input.source == PlanSource::Generated {
            let caller = accounts.require_account(ctx.account_id).await?;
            Capabilities::check(ctx.role, caller.subscription_tier, Operation::GeneratePlan)?;
        }

        let member = accounts.require_account(input.member_id).await?;
        authorize_member_access(ctx, &member)?;
        if member.role != Role::User {
            return Err(AppError::invalid_input("Plans can only be assigned to members"));
        }

        let workout_plan = non_blank(input.workout_plan);
        let diet_plan = non_blank(input.diet_plan);
        if workout_plan.is_none() && diet_plan.is_none() {
            return Err(AppError::invalid_input(
                "A plan needs a workout or a diet section",
            ));
        }

        let plan = DailyPlan {
            account_id: member.id,
            plan_date: input.date,
            workout_plan,
            diet_plan,
            source: input.source,
            assigned_by: ctx.account_id,
            updated_at: Utc::now(),
        };
        self.database.plans().upsert_plan(&plan).await?;
        info!(
            member.id = %plan.account_id,
            assigned_by = %plan.assigned_by,
            date = %plan.plan_date,
            source = %plan.source,
            "Plan assigned"
        );
        Ok(plan)
    }

    /// A member's plan for a date, as seen by a coach
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when the caller may not manage the member
    pub async fn member_plan(
        &self,
        ctx: &AccountContext,
        member_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<DailyPlan>> {
        Capabilities::require_role(ctx.role, Operation::AssignPlan)?;
        let member = self.database.accounts().require_account(member_id).await?;
        authorize_member_access(ctx, &member)?;
        self.database.plans().get_plan(member_id, date).await
    }

    /// The caller's plan for today
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn todays_plan(&self, ctx: &AccountContext) -> AppResult<TodaysPlan> {
        self.todays_plan_at(ctx, Utc::now()).await
    }

    /// The caller's plan for the calendar day containing `now`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn todays_plan_at(&self, ctx: &AccountContext, now: DateTime<Utc>) -> AppResult<TodaysPlan> {
        let date = progression::day_key(now, self.offset);
        let plan = self.database.plans().get_plan(ctx.account_id, date).await?;
        let exercises = plan
            .as_ref()
            .and_then(|plan| plan.workout_plan.as_deref())
            .map(parse_workout_plan)
            .unwrap_or_default();
        let total_points = total_points(&exercises);

        Ok(TodaysPlan {
            date,
            plan,
            exercises,
            total_points,
        })
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
