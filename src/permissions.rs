// ABOUTME: Capability table mapping role and subscription tier to permitted operations
// ABOUTME: Checked once at each service operation boundary before any storage write
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Role and tier capability checks
//!
//! A role mismatch fails with `PermissionDenied`. A role that may perform the
//! operation on a different plan fails with `TierRestricted`, so clients can
//! offer an upgrade instead of an error.

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{Role, SubscriptionTier};

/// Operations guarded by the capability table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Complete the daily quest
    CompleteQuest,
    /// Log the day's diet
    LogDiet,
    /// Record a weight sample
    LogWeight,
    /// Request a cash redemption
    RequestRedemption,
    /// Approve or reject a redemption
    ResolveRedemption,
    /// List pending redemptions
    ListPendingRedemptions,
    /// Assign a manually authored plan
    AssignPlan,
    /// Assign a generated plan
    GeneratePlan,
    /// View a member's full progress
    ViewMemberProgress,
    /// List the members of the caller's gym
    ListGymMembers,
    /// Change an account's subscription tier
    UpdateSubscription,
    /// List every account and gym
    AdminOverview,
    /// Edit the caller's own gym
    UpdateGym,
}

impl Operation {
    /// Roles allowed to attempt the operation
    #[must_use]
    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Self::CompleteQuest | Self::LogDiet | Self::LogWeight | Self::RequestRedemption => {
                &[Role::User]
            }
            Self::ResolveRedemption
            | Self::ListPendingRedemptions
            | Self::UpdateSubscription
            | Self::AdminOverview => &[Role::Admin],
            Self::ListGymMembers | Self::UpdateGym => &[Role::GymOwner],
            Self::AssignPlan | Self::GeneratePlan | Self::ViewMemberProgress => {
                &[Role::Admin, Role::GymOwner]
            }
        }
    }

    /// Tiers required for `role`, `None` when every tier qualifies
    #[must_use]
    pub const fn required_tiers(self, role: Role) -> Option<&'static [SubscriptionTier]> {
        match (self, role) {
            (Self::RequestRedemption, Role::User) => Some(&[SubscriptionTier::Gold]),
            (Self::GeneratePlan, Role::GymOwner) => Some(&[SubscriptionTier::GymPrime]),
            _ => None,
        }
    }
}

/// Capability checker
pub struct Capabilities;

impl Capabilities {
    /// Check whether `role` on `tier` may perform `operation`
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for a role mismatch and `TierRestricted`
    /// when the tier lacks the feature
    pub fn check(role: Role, tier: SubscriptionTier, operation: Operation) -> AppResult<()> {
        if !operation.allowed_roles().contains(&role) {
            return Err(AppError::permission_denied(format!(
                "Role '{role}' may not perform {operation:?}"
            )));
        }
        match operation.required_tiers(role) {
            Some(tiers) if !tiers.contains(&tier) => {
                if operation == Operation::RequestRedemption {
                    Err(AppError::tier_restricted())
                } else {
                    Err(AppError::new(
                        ErrorCode::TierRestricted,
                        format!("{operation:?} is not included in the {} plan", tier.display_name()),
                    ))
                }
            }
            _ => Ok(()),
        }
    }

    /// Role-only check for operations that do not depend on the tier
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for a role mismatch
    pub fn require_role(role: Role, operation: Operation) -> AppResult<()> {
        if operation.allowed_roles().contains(&role) {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "Role '{role}' may not perform {operation:?}"
            )))
        }
    }

    /// Whether an operation is permitted without producing an error
    #[must_use]
    pub fn permits(role: Role, tier: SubscriptionTier, operation: Operation) -> bool {
        Self::check(role, tier, operation).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redemption_requires_gold() {
        assert!(Capabilities::permits(
            Role::User,
            SubscriptionTier::Gold,
            Operation::RequestRedemption
        ));
        let err = Capabilities::check(
            Role::User,
            SubscriptionTier::Silver,
            Operation::RequestRedemption,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::TierRestricted);
    }

    #[test]
    fn test_admin_only_operations() {
        let err = Capabilities::require_role(Role::GymOwner, Operation::ResolveRedemption)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert!(Capabilities::require_role(Role::Admin, Operation::ResolveRedemption).is_ok());
    }

    #[test]
    fn test_only_gym_owners_edit_gyms() {
        assert!(Capabilities::require_role(Role::GymOwner, Operation::UpdateGym).is_ok());
        for role in [Role::User, Role::Admin] {
            let err = Capabilities::require_role(role, Operation::UpdateGym).unwrap_err();
            assert_eq!(err.code, ErrorCode::PermissionDenied);
        }
    }

    #[test]
    fn test_generated_plans_need_gym_prime() {
        assert!(Capabilities::permits(
            Role::GymOwner,
            SubscriptionTier::GymPrime,
            Operation::GeneratePlan
        ));
        assert!(Capabilities::permits(
            Role::Admin,
            SubscriptionTier::Bronze,
            Operation::GeneratePlan
        ));
        let err =
            Capabilities::check(Role::GymOwner, SubscriptionTier::GymFree, Operation::GeneratePlan)
                .unwrap_err();
        assert_eq!(err.code, ErrorCode::TierRestricted);
        assert!(!Capabilities::permits(
            Role::User,
            SubscriptionTier::Gold,
            Operation::GeneratePlan
        ));
    }
}
