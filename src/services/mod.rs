// ABOUTME: Domain service layer for the progression ledger, redemptions, accounts and plans
// ABOUTME: Services check capabilities, validate input, call storage and publish snapshots
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! Route handlers translate HTTP into calls on these services. Every public
//! operation takes an explicit [`AccountContext`] and has an `_at` variant
//! taking the current instant, so day rollover is testable.

use crate::auth::AccountContext;
use crate::errors::{AppError, AppResult};
use crate::models::{Account, Role};

/// Registration, login, gyms and subscriptions
pub mod accounts;
/// Per-day plans and today's quest
pub mod plans;
/// Quests, diet logs, weight samples and account snapshots
pub mod progression;
/// Cash redemption requests and their resolution
pub mod redemption;

pub use accounts::{
    AccountService, AuthSession, RegisterGymOwner, RegisterMember, UpdateGym, UpdateProfile,
};
pub use plans::{AssignPlan, PlanService};
pub use progression::ProgressionLedger;
pub use redemption::{RedemptionReceipt, RedemptionWorkflow};

/// Whether the caller may act on `member`'s records
///
/// Administrators may act on anyone. Gym owners may act on members of their
/// own gym, which is identified by the owner's account id.
///
/// # Errors
///
/// Returns `PermissionDenied` otherwise
pub fn authorize_member_access(ctx: &AccountContext, member: &Account) -> AppResult<()> {
    let owns_gym = ctx.role == Role::GymOwner
        && member.id != ctx.account_id
        && member.gym_id == Some(ctx.account_id);
    if ctx.is_admin() || owns_gym {
        Ok(())
    } else {
        Err(AppError::permission_denied(
            "You can only manage members of your own gym",
        ))
    }
}
