// ABOUTME: Account and gym storage operations including atomic gym-owner registration
// ABOUTME: Maps account rows to models and exposes gym membership queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::rows::{
    encode_timestamp, parse_enum, parse_optional_timestamp, parse_optional_uuid, parse_timestamp,
    parse_uuid,
};
use super::transactions::TransactionGuard;
use crate::errors::{AppError, AppResult};
use crate::models::{Account, Gym, GymSummary, LeaderboardEntry, Role, SubscriptionTier};

pub(super) const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, goal, gym_id, role, \
     subscription_tier, points, level, streak, last_completed_quest_at, last_logged_diet_at, created_at";

/// Fields needed to create an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Display name
    pub username: String,
    /// Normalized login email
    pub email: String,
    /// bcrypt hash
    pub password_hash: String,
    /// Initial goal
    pub goal: String,
    /// Gym membership
    pub gym_id: Option<Uuid>,
    /// Role
    pub role: Role,
    /// Initial tier
    pub subscription_tier: SubscriptionTier,
}

impl NewAccount {
    fn into_account(self, id: Uuid, created_at: DateTime<Utc>) -> Account {
        Account {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            goal: self.goal,
            gym_id: self.gym_id,
            role: self.role,
            subscription_tier: self.subscription_tier,
            points: 0,
            level: 1,
            streak: 0,
            last_completed_quest_at: None,
            last_logged_diet_at: None,
            created_at,
        }
    }
}

/// Account and gym database operations manager
pub struct AccountManager {
    pool: SqlitePool,
}

impl AccountManager {
    /// Create a new account manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Insert a member or administrator account
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the email is taken
    pub async fn create_account(&self, new: NewAccount, now: DateTime<Utc>) -> AppResult<Account> {
        let mut conn = self.pool.acquire().await?;
        let account = new.into_account(Uuid::new_v4(), now);
        insert_account(&mut conn, &account).await?;
        Ok(account)
    }

    /// Create a gym owner and their gym in one transaction
    ///
    /// The gym id equals the owner's account id and the owner's `gym_id`
    /// points at it.
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the email is taken
    pub async fn create_gym_owner(
        &self,
        new: NewAccount,
        gym_name: &str,
        address: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<(Account, Gym)> {
        let id = Uuid::new_v4();
        let account = NewAccount {
            gym_id: Some(id),
            ..new
        }
        .into_account(id, now);
        let gym = Gym {
            id,
            name: gym_name.to_owned(),
            owner_id: id,
            address: address.map(str::to_owned),
            created_at: now,
        };

        let mut guard = TransactionGuard::new(self.pool.begin().await?);
        insert_account(guard.executor()?, &account).await?;
        sqlx::query(
            r"
            INSERT INTO gyms (id, name, owner_id, address, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(gym.id.to_string())
        .bind(&gym.name)
        .bind(gym.owner_id.to_string())
        .bind(gym.address.as_deref())
        .bind(encode_timestamp(gym.created_at))
        .execute(guard.executor()?)
        .await?;
        guard.commit().await?;

        Ok((account, gym))
    }

    /// Get an account by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_account(&self, id: Uuid) -> AppResult<Option<Account>> {
        let mut conn = self.pool.acquire().await?;
        fetch_account(&mut conn, id).await
    }

    /// Get an account by id or fail with `ResourceNotFound`
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no such account exists
    pub async fn require_account(&self, id: Uuid) -> AppResult<Account> {
        self.get_account(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account {id}")))
    }

    /// Get an account by normalized email
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_account_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
        sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_account)
            .transpose()
    }

    /// All accounts, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_accounts(&self) -> AppResult<Vec<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at ASC");
        sqlx::query(&query)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_account)
            .collect()
    }

    /// Members of a gym, excluding its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_gym_members(&self, gym_id: Uuid) -> AppResult<Vec<Account>> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE gym_id = $1 AND id != $1 ORDER BY username ASC"
        );
        sqlx::query(&query)
            .bind(gym_id.to_string())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_account)
            .collect()
    }

    /// Set an account's subscription tier
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no such account exists
    pub async fn update_subscription(
        &self,
        id: Uuid,
        tier: SubscriptionTier,
    ) -> AppResult<Account> {
        let mut guard = TransactionGuard::new(self.pool.begin().await?);
        let result = sqlx::query("UPDATE accounts SET subscription_tier = $1 WHERE id = $2")
            .bind(tier.as_str())
            .bind(id.to_string())
            .execute(guard.executor()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Account {id}")));
        }
        let account = require_account_in(guard.executor()?, id).await?;
        guard.commit().await?;
        Ok(account)
    }

    /// Change an account's display name and goal
    ///
    /// The goal is only written while it still holds `unset_goal`, so two
    /// racing updates cannot both set it.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no such account exists
    pub async fn update_profile(
        &self,
        id: Uuid,
        username: Option<&str>,
        goal: Option<&str>,
        unset_goal: &str,
    ) -> AppResult<Account> {
        let mut guard = TransactionGuard::new(self.pool.begin().await?);
        let result = sqlx::query(
            r"
            UPDATE accounts
            SET username = COALESCE($1, username),
                goal = CASE WHEN $2 IS NOT NULL AND goal = $3 THEN $2 ELSE goal END
            WHERE id = $4
            ",
        )
        .bind(username)
        .bind(goal)
        .bind(unset_goal)
        .bind(id.to_string())
        .execute(guard.executor()?)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Account {id}")));
        }
        let account = require_account_in(guard.executor()?, id).await?;
        guard.commit().await?;
        Ok(account)
    }

    /// Members with the longest quest streaks
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn leaderboard(&self, limit: i64) -> AppResult<Vec<LeaderboardEntry>> {
        let rows = sqlx::query(
            r"
            SELECT id, username, streak FROM accounts
            WHERE role = $1
            ORDER BY streak DESC, username ASC
            LIMIT $2
            ",
        )
        .bind(Role::User.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                Ok(LeaderboardEntry {
                    account_id: parse_uuid(&id)?,
                    username: row.get("username"),
                    streak: row.get("streak"),
                })
            })
            .collect()
    }

    // ========================================================================
    // Gyms
    // ========================================================================

    /// Rename a gym and set its address
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no such gym exists
    pub async fn update_gym(&self, id: Uuid, name: &str, address: Option<&str>) -> AppResult<Gym> {
        sqlx::query(
            r"
            UPDATE gyms SET name = $1, address = $2 WHERE id = $3
            RETURNING id, name, owner_id, address, created_at
            ",
        )
        .bind(name)
        .bind(address)
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(row_to_gym)
        .transpose()?
        .ok_or_else(|| AppError::not_found(format!("Gym {id}")))
    }

    /// Get a gym by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_gym(&self, id: Uuid) -> AppResult<Option<Gym>> {
        sqlx::query("SELECT id, name, owner_id, address, created_at FROM gyms WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_gym)
            .transpose()
    }

    /// All gyms ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_gyms(&self) -> AppResult<Vec<Gym>> {
        sqlx::query("SELECT id, name, owner_id, address, created_at FROM gyms ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_gym)
            .collect()
    }

    /// Gyms with owner name and member count
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_gym_summaries(&self) -> AppResult<Vec<GymSummary>> {
        let rows = sqlx::query(
            r"
            SELECT g.id, g.name, g.owner_id, g.address, g.created_at,
                   COALESCE(o.username, '') AS owner_name,
                   (SELECT COUNT(*) FROM accounts m WHERE m.gym_id = g.id AND m.id != g.owner_id)
                       AS member_count
            FROM gyms g
            LEFT JOIN accounts o ON o.id = g.owner_id
            ORDER BY g.name ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(GymSummary {
                    gym: row_to_gym(row)?,
                    owner_name: row.get("owner_name"),
                    member_count: row.get("member_count"),
                })
            })
            .collect()
    }
}

async fn insert_account(conn: &mut SqliteConnection, account: &Account) -> AppResult<()> {
    let result = sqlx::query(
        r"
        INSERT INTO accounts (
            id, username, email, password_hash, goal, gym_id, role, subscription_tier,
            points, level, streak, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT(email) DO NOTHING
        ",
    )
    .bind(account.id.to_string())
    .bind(&account.username)
    .bind(&account.email)
    .bind(&account.password_hash)
    .bind(&account.goal)
    .bind(account.gym_id.map(|id| id.to_string()))
    .bind(account.role.as_str())
    .bind(account.subscription_tier.as_str())
    .bind(account.points)
    .bind(account.level)
    .bind(account.streak)
    .bind(encode_timestamp(account.created_at))
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::already_exists(format!(
            "An account with email {} already exists",
            account.email
        )));
    }
    Ok(())
}

/// Load an account on an existing connection or transaction
pub(super) async fn fetch_account(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> AppResult<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
    sqlx::query(&query)
        .bind(id.to_string())
        .fetch_optional(conn)
        .await?
        .as_ref()
        .map(row_to_account)
        .transpose()
}

pub(super) async fn require_account_in(conn: &mut SqliteConnection, id: Uuid) -> AppResult<Account> {
    fetch_account(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Account {id}")))
}

pub(super) fn row_to_account(row: &SqliteRow) -> AppResult<Account> {
    let id: String = row.get("id");
    let gym_id: Option<String> = row.get("gym_id");
    let role: String = row.get("role");
    let tier: String = row.get("subscription_tier");
    let created_at: String = row.get("created_at");

    Ok(Account {
        id: parse_uuid(&id)?,
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        goal: row.get("goal"),
        gym_id: parse_optional_uuid(gym_id)?,
        role: parse_enum(&role)?,
        subscription_tier: parse_enum(&tier)?,
        points: row.get("points"),
        level: row.get("level"),
        streak: row.get("streak"),
        last_completed_quest_at: parse_optional_timestamp(row.get("last_completed_quest_at"))?,
        last_logged_diet_at: parse_optional_timestamp(row.get("last_logged_diet_at"))?,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn row_to_gym(row: &SqliteRow) -> AppResult<Gym> {
    let id: String = row.get("id");
    let owner_id: String = row.get("owner_id");
    let created_at: String = row.get("created_at");

    Ok(Gym {
        id: parse_uuid(&id)?,
        name: row.get("name"),
        owner_id: parse_uuid(&owner_id)?,
        address: row.get("address"),
        created_at: parse_timestamp(&created_at)?,
    })
}
