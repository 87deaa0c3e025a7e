// ABOUTME: Account lifecycle: member and gym-owner registration, login and subscriptions
// ABOUTME: Also serves gym rosters, member progress and the administrator overview
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::authorize_member_access;
use crate::auth::{AccountContext, AuthManager};
use crate::config::LedgerConfig;
use crate::constants::env_config::MIN_PASSWORD_LEN;
use crate::constants::ledger::{
    DEFAULT_LEADERBOARD_SIZE, DEFAULT_MEMBER_GOAL, DEFAULT_OWNER_GOAL, MAX_LEADERBOARD_SIZE,
    MEMBER_GOALS,
};
use crate::database::{Database, NewAccount};
use crate::errors::{AppError, AppResult};
use crate::models::{
    Account, AccountSnapshot, Gym, GymSummary, LeaderboardEntry, MemberProgress, Role,
    SubscriptionTier,
};
use crate::notifications::AccountEvents;
use crate::permissions::{Capabilities, Operation};

const MAX_USERNAME_LEN: usize = 50;

/// Member registration input
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterMember {
    /// Display name
    pub username: String,
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Gym to join
    #[serde(default)]
    pub gym_id: Option<Uuid>,
}

/// Gym owner registration input
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterGymOwner {
    /// Display name
    pub username: String,
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Name of the gym to create
    pub gym_name: String,
    /// Gym street address
    #[serde(default)]
    pub address: Option<String>,
}

/// Profile fields an account may change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    /// New display name
    #[serde(default)]
    pub username: Option<String>,
    /// Goal to set, accepted only while the goal is unset
    #[serde(default)]
    pub goal: Option<String>,
}

/// Gym details an owner may change
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGym {
    /// Gym name
    pub name: String,
    /// Street address, cleared when blank or absent
    #[serde(default)]
    pub address: Option<String>,
}

/// Token plus account state returned by login and registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token
    pub token: String,
    /// Token expiry as a unix timestamp
    pub expires_at: i64,
    /// Account state
    pub account: AccountSnapshot,
}

/// Account service
#[derive(Clone)]
pub struct AccountService {
    database: Database,
    auth: Arc<AuthManager>,
    events: AccountEvents,
    offset: FixedOffset,
}

impl AccountService {
    /// Create the account service
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if the day offset is out of range
    pub fn new(
        database: Database,
        auth: Arc<AuthManager>,
        events: AccountEvents,
        config: &LedgerConfig,
    ) -> AppResult<Self> {
        Ok(Self {
            database,
            auth,
            events,
            offset: config.day_offset()?,
        })
    }

    fn snapshot(&self, account: &Account, now: DateTime<Utc>) -> AccountSnapshot {
        AccountSnapshot::from_account(account, now, self.offset)
    }

    fn session(&self, account: &Account, now: DateTime<Utc>) -> AppResult<AuthSession> {
        let issued = self.auth.generate_token(account)?;
        Ok(AuthSession {
            token: issued.token,
            expires_at: issued.expires_at,
            account: self.snapshot(account, now),
        })
    }

    // ========================================================================
    // Registration and login
    // ========================================================================

    /// Register a member on the bronze plan
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed fields, `ResourceNotFound` for an
    /// unknown gym and `ResourceAlreadyExists` for a taken email
    #[instrument(skip_all, fields(email = %input.email))]
    pub async fn register_user(&self, input: RegisterMember) -> AppResult<AuthSession> {
        let (username, email) = validate_identity(&input.username, &input.email, &input.password)?;
        if let Some(gym_id) = input.gym_id {
            self.database
                .accounts()
                .get_gym(gym_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Gym {gym_id}")))?;
        }

        let now = Utc::now();
        let account = self
            .database
            .accounts()
            .create_account(
                NewAccount {
                    username,
                    email,
                    password_hash: self.auth.hash_password(&input.password).await?,
                    goal: DEFAULT_MEMBER_GOAL.to_owned(),
                    gym_id: input.gym_id,
                    role: Role::User,
                    subscription_tier: SubscriptionTier::default_for(Role::User),
                },
                now,
            )
            .await?;

        info!(account.id = %account.id, "Member registered");
        self.session(&account, now)
    }

    /// Register a gym owner together with their gym
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed fields and `ResourceAlreadyExists`
    /// for a taken email
    #[instrument(skip_all, fields(email = %input.email))]
    pub async fn register_gym_owner(&self, input: RegisterGymOwner) -> AppResult<(AuthSession, Gym)> {
        let (username, email) = validate_identity(&input.username, &input.email, &input.password)?;
        let gym_name = input.gym_name.trim();
        if gym_name.is_empty() {
            return Err(AppError::invalid_input("Gym name is required"));
        }
        let address = input
            .address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty());

        let now = Utc::now();
        let (account, gym) = self
            .database
            .accounts()
            .create_gym_owner(
                NewAccount {
                    username,
                    email,
                    password_hash: self.auth.hash_password(&input.password).await?,
                    goal: DEFAULT_OWNER_GOAL.to_owned(),
                    gym_id: None,
                    role: Role::GymOwner,
                    subscription_tier: SubscriptionTier::default_for(Role::GymOwner),
                },
                gym_name,
                address,
                now,
            )
            .await?;

        info!(account.id = %account.id, gym.name = %gym.name, "Gym owner registered");
        Ok((self.session(&account, now)?, gym))
    }

    /// Create an administrator unless the email is already registered
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed fields
    pub async fn ensure_admin(&self, username: &str, email: &str, password: &str) -> AppResult<Account> {
        let (username, email) = validate_identity(username, email, password)?;
        if let Some(existing) = self.database.accounts().get_account_by_email(&email).await? {
            if existing.role != Role::Admin {
                warn!(account.id = %existing.id, "Bootstrap admin email belongs to a non-admin account");
            }
            return Ok(existing);
        }
        let account = self
            .database
            .accounts()
            .create_account(
                NewAccount {
                    username,
                    email,
                    password_hash: self.auth.hash_password(password).await?,
                    goal: DEFAULT_MEMBER_GOAL.to_owned(),
                    gym_id: None,
                    role: Role::Admin,
                    subscription_tier: SubscriptionTier::default_for(Role::Admin),
                },
                Utc::now(),
            )
            .await?;
        info!(account.id = %account.id, "Administrator account created");
        Ok(account)
    }

    /// Exchange credentials for a token
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for unknown emails and wrong passwords alike
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let email = normalize_email(email);
        let invalid = || AppError::auth_invalid("Invalid email or password");
        let account = self
            .database
            .accounts()
            .get_account_by_email(&email)
            .await?
            .ok_or_else(invalid)?;
        if !self.auth.verify_password(password, &account.password_hash).await? {
            return Err(invalid());
        }
        info!(account.id = %account.id, "Login succeeded");
        self.session(&account, Utc::now())
    }

    // ========================================================================
    // Profile
    // ========================================================================

    /// Change the caller's display name and, once, their goal
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty update, a malformed username, an
    /// unknown goal or a goal that is already set
    #[instrument(skip_all, fields(account.id = %ctx.account_id))]
    pub async fn update_profile(
        &self,
        ctx: &AccountContext,
        input: UpdateProfile,
    ) -> AppResult<AccountSnapshot> {
        let username = input.username.as_deref().map(validate_username).transpose()?;
        let goal = input.goal.as_deref().map(str::trim);
        if username.is_none() && goal.is_none() {
            return Err(AppError::invalid_input("Nothing to update"));
        }

        let accounts = self.database.accounts();
        let account = accounts.require_account(ctx.account_id).await?;
        // Re-sending the current goal is a no-op
        let goal = goal.filter(|goal| *goal != account.goal);
        if let Some(goal) = goal {
            if !MEMBER_GOALS.contains(&goal) {
                return Err(AppError::invalid_input(format!("Unknown goal '{goal}'")));
            }
            if account.goal != DEFAULT_MEMBER_GOAL {
                return Err(AppError::invalid_input("Your goal has already been set"));
            }
        }

        let updated = accounts
            .update_profile(ctx.account_id, username, goal, DEFAULT_MEMBER_GOAL)
            .await?;
        info!(goal = %updated.goal, "Profile updated");
        let snapshot = self.snapshot(&updated, Utc::now());
        self.events.publish(&snapshot).await;
        Ok(snapshot)
    }

    /// Members with the longest streaks, `limit` defaults to three
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn leaderboard(&self, limit: Option<i64>) -> AppResult<Vec<LeaderboardEntry>> {
        let limit = limit
            .unwrap_or(DEFAULT_LEADERBOARD_SIZE)
            .clamp(1, MAX_LEADERBOARD_SIZE);
        self.database.accounts().leaderboard(limit).await
    }

    // ========================================================================
    // Gyms
    // ========================================================================

    /// All gyms, for the registration picker
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_gyms(&self) -> AppResult<Vec<Gym>> {
        self.database.accounts().list_gyms().await
    }

    /// Members of the caller's gym
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` unless the caller owns a gym
    pub async fn list_gym_members(&self, ctx: &AccountContext) -> AppResult<Vec<AccountSnapshot>> {
        Capabilities::require_role(ctx.role, Operation::ListGymMembers)?;
        let now = Utc::now();
        let members = self.database.accounts().list_gym_members(ctx.account_id).await?;
        Ok(members.iter().map(|m| self.snapshot(m, now)).collect())
    }

    /// Rename the caller's gym and set its address
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` unless the caller owns a gym and
    /// `InvalidInput` for a blank name
    pub async fn update_gym(&self, ctx: &AccountContext, input: UpdateGym) -> AppResult<Gym> {
        Capabilities::require_role(ctx.role, Operation::UpdateGym)?;
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_input("Gym name is required"));
        }
        let address = input
            .address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty());

        let gym = self
            .database
            .accounts()
            .update_gym(ctx.account_id, name, address)
            .await?;
        info!(gym.id = %gym.id, gym.name = %gym.name, "Gym updated");
        Ok(gym)
    }

    /// Snapshot plus full history of a member
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` unless the caller is an administrator or
    /// owns the member's gym
    pub async fn member_progress(
        &self,
        ctx: &AccountContext,
        member_id: Uuid,
    ) -> AppResult<MemberProgress> {
        Capabilities::require_role(ctx.role, Operation::ViewMemberProgress)?;
        let member = self.database.accounts().require_account(member_id).await?;
        authorize_member_access(ctx, &member)?;

        let ledger = self.database.ledger();
        Ok(MemberProgress {
            account: self.snapshot(&member, Utc::now()),
            workouts: ledger.list_completions(member_id).await?,
            diet: ledger.list_diet_logs(member_id).await?,
            weights: ledger.list_weights(member_id).await?,
            redemptions: self.database.redemptions().list_history(member_id).await?,
        })
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Change an account's tier after an external upgrade
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for non-administrators and `InvalidInput`
    /// when the tier is not offered to the account's role
    pub async fn update_subscription(
        &self,
        ctx: &AccountContext,
        account_id: Uuid,
        tier: SubscriptionTier,
    ) -> AppResult<AccountSnapshot> {
        Capabilities::require_role(ctx.role, Operation::UpdateSubscription)?;
        let accounts = self.database.accounts();
        let account = accounts.require_account(account_id).await?;
        if !tier.available_to(account.role) {
            return Err(AppError::invalid_input(format!(
                "The {} plan is not available to {} accounts",
                tier.display_name(),
                account.role
            )));
        }

        let updated = accounts.update_subscription(account_id, tier).await?;
        info!(
            account.id = %account_id,
            admin.id = %ctx.account_id,
            tier = %tier,
            "Subscription updated"
        );
        let snapshot = self.snapshot(&updated, Utc::now());
        self.events.publish(&snapshot).await;
        Ok(snapshot)
    }

    /// Every account
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for non-administrators
    pub async fn admin_accounts(&self, ctx: &AccountContext) -> AppResult<Vec<AccountSnapshot>> {
        Capabilities::require_role(ctx.role, Operation::AdminOverview)?;
        let now = Utc::now();
        let accounts = self.database.accounts().list_accounts().await?;
        Ok(accounts.iter().map(|a| self.snapshot(a, now)).collect())
    }

    /// Members of any gym, for administrators
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for non-administrators and
    /// `ResourceNotFound` for an unknown gym
    pub async fn admin_gym_members(
        &self,
        ctx: &AccountContext,
        gym_id: Uuid,
    ) -> AppResult<Vec<AccountSnapshot>> {
        Capabilities::require_role(ctx.role, Operation::AdminOverview)?;
        let accounts = self.database.accounts();
        accounts
            .get_gym(gym_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Gym {gym_id}")))?;
        let now = Utc::now();
        let members = accounts.list_gym_members(gym_id).await?;
        Ok(members.iter().map(|m| self.snapshot(m, now)).collect())
    }

    /// Every gym with owner name and member count
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for non-administrators
    pub async fn admin_gyms(&self, ctx: &AccountContext) -> AppResult<Vec<GymSummary>> {
        Capabilities::require_role(ctx.role, Operation::AdminOverview)?;
        self.database.accounts().list_gym_summaries().await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_username(username: &str) -> AppResult<&str> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::invalid_input("Username is required"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::invalid_input(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(username)
}

fn validate_identity(username: &str, email: &str, password: &str) -> AppResult<(String, String)> {
    let username = validate_username(username)?;

    let email = normalize_email(email);
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if !valid_email {
        return Err(AppError::invalid_input("A valid email address is required"));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::invalid_input(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok((username.to_owned(), email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_identity_validation() {
        let (username, email) =
            validate_identity("  Sung Jinwoo ", " Jinwoo@Example.COM ", "arise!").unwrap();
        assert_eq!(username, "Sung Jinwoo");
        assert_eq!(email, "jinwoo@example.com");

        for (username, email, password) in [
            ("", "a@b.co", "secret"),
            ("hunter", "not-an-email", "secret"),
            ("hunter", "a@b.co", "short"),
        ] {
            let err = validate_identity(username, email, password).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidInput);
        }
    }
}
