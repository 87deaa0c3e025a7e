// ABOUTME: Redemption storage: guarded point debit, request creation and resolution
// ABOUTME: Debit, history entry and pending request are written in one transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::accounts::require_account_in;
use super::rows::{
    encode_timestamp, parse_enum, parse_optional_timestamp, parse_optional_uuid, parse_timestamp,
    parse_uuid,
};
use super::transactions::TransactionGuard;
use crate::constants::ledger::POINTS_PER_LEVEL;
use crate::errors::{AppError, AppResult};
use crate::models::{
    Account, RedemptionDecision, RedemptionHistoryEntry, RedemptionRequest, RedemptionStatus,
    SubscriptionTier,
};

const REQUEST_COLUMNS: &str = "id, account_id, username, points_requested, payout_destination, \
     requested_at, status, resolved_at, resolved_by";

/// Outcome of resolving a request
#[derive(Debug, Clone)]
pub struct ResolvedRedemption {
    /// Request after the transition
    pub request: RedemptionRequest,
    /// Requesting account after a refund, `None` when nothing was credited
    pub refunded_account: Option<Account>,
}

/// Redemption database operations manager
pub struct RedemptionManager {
    pool: SqlitePool,
}

impl RedemptionManager {
    /// Create a new redemption manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Debit points and create a pending request with its history entry
    ///
    /// The debit only applies while the account is still on `required_tier`
    /// and still holds at least `points`, so a concurrent debit or downgrade
    /// can never push the balance below zero.
    ///
    /// # Errors
    ///
    /// Returns `TierRestricted` or `InsufficientBalance` when the guarded
    /// debit does not apply, and `ResourceNotFound` for a missing account
    pub async fn create_request(
        &self,
        account_id: Uuid,
        points: i64,
        payout_destination: &str,
        required_tier: SubscriptionTier,
        now: DateTime<Utc>,
    ) -> AppResult<(RedemptionRequest, Account)> {
        let mut guard = TransactionGuard::new(self.pool.begin().await?);

        let debited = sqlx::query(
            r"
            UPDATE accounts
            SET points = points - $1,
                level = ((points - $1) / $2) + 1
            WHERE id = $3 AND subscription_tier = $4 AND points >= $1
            ",
        )
        .bind(points)
        .bind(POINTS_PER_LEVEL)
        .bind(account_id.to_string())
        .bind(required_tier.as_str())
        .execute(guard.executor()?)
        .await?;

        if debited.rows_affected() == 0 {
            let account = require_account_in(guard.executor()?, account_id).await?;
            guard.rollback().await?;
            return Err(if account.subscription_tier == required_tier {
                AppError::insufficient_balance(points, account.points)
            } else {
                AppError::tier_restricted()
            });
        }

        let account = require_account_in(guard.executor()?, account_id).await?;
        let request = RedemptionRequest {
            id: Uuid::new_v4(),
            account_id,
            username: account.username.clone(),
            points_requested: points,
            payout_destination: payout_destination.to_owned(),
            requested_at: now,
            status: RedemptionStatus::Pending,
            resolved_at: None,
            resolved_by: None,
        };

        sqlx::query(
            r"
            INSERT INTO redemption_requests (
                id, account_id, username, points_requested, payout_destination, requested_at, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(request.id.to_string())
        .bind(request.account_id.to_string())
        .bind(&request.username)
        .bind(request.points_requested)
        .bind(&request.payout_destination)
        .bind(encode_timestamp(request.requested_at))
        .bind(request.status.as_str())
        .execute(guard.executor()?)
        .await?;

        sqlx::query(
            r"
            INSERT INTO redemption_history (id, account_id, request_id, points_redeemed, redeemed_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(account_id.to_string())
        .bind(request.id.to_string())
        .bind(points)
        .bind(encode_timestamp(now))
        .execute(guard.executor()?)
        .await?;

        guard.commit().await?;
        Ok((request, account))
    }

    /// Move a pending request to its terminal status
    ///
    /// When `refund` is set and the decision is a rejection, the requested
    /// points are credited back in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown request and `NotPending`
    /// when the request was already resolved
    pub async fn resolve_request(
        &self,
        request_id: Uuid,
        decision: RedemptionDecision,
        resolved_by: Uuid,
        refund: bool,
        now: DateTime<Utc>,
    ) -> AppResult<ResolvedRedemption> {
        let status = decision.resulting_status();
        let mut guard = TransactionGuard::new(self.pool.begin().await?);

        let existing = fetch_request(guard.executor()?, request_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Redemption request {request_id}")))?;
        if existing.status.is_terminal() {
            guard.rollback().await?;
            return Err(AppError::not_pending(existing.status));
        }

        let updated = sqlx::query(
            r"
            UPDATE redemption_requests
            SET status = $1, resolved_at = $2, resolved_by = $3
            WHERE id = $4 AND status = 'pending'
            ",
        )
        .bind(status.as_str())
        .bind(encode_timestamp(now))
        .bind(resolved_by.to_string())
        .bind(request_id.to_string())
        .execute(guard.executor()?)
        .await?;
        if updated.rows_affected() == 0 {
            guard.rollback().await?;
            return Err(AppError::not_pending("resolved"));
        }

        let refunded_account = if refund && status == RedemptionStatus::Rejected {
            debug!(request.id = %request_id, points = existing.points_requested, "Refunding rejected redemption");
            sqlx::query(
                r"
                UPDATE accounts
                SET points = points + $1,
                    level = ((points + $1) / $2) + 1
                WHERE id = $3
                ",
            )
            .bind(existing.points_requested)
            .bind(POINTS_PER_LEVEL)
            .bind(existing.account_id.to_string())
            .execute(guard.executor()?)
            .await?;
            Some(require_account_in(guard.executor()?, existing.account_id).await?)
        } else {
            None
        };

        guard.commit().await?;

        Ok(ResolvedRedemption {
            request: RedemptionRequest {
                status,
                resolved_at: Some(now),
                resolved_by: Some(resolved_by),
                ..existing
            },
            refunded_account,
        })
    }

    /// Get a request by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_request(&self, request_id: Uuid) -> AppResult<Option<RedemptionRequest>> {
        let mut conn = self.pool.acquire().await?;
        fetch_request(&mut conn, request_id).await
    }

    /// Pending requests, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_pending(&self) -> AppResult<Vec<RedemptionRequest>> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM redemption_requests WHERE status = 'pending' \
             ORDER BY requested_at DESC"
        );
        sqlx::query(&query)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_request)
            .collect()
    }

    /// Requests made by an account, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_requests_for(&self, account_id: Uuid) -> AppResult<Vec<RedemptionRequest>> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM redemption_requests WHERE account_id = $1 \
             ORDER BY requested_at DESC"
        );
        sqlx::query(&query)
            .bind(account_id.to_string())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_request)
            .collect()
    }

    /// Personal redemption history, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_history(&self, account_id: Uuid) -> AppResult<Vec<RedemptionHistoryEntry>> {
        let rows = sqlx::query(
            r"
            SELECT id, account_id, request_id, points_redeemed, redeemed_at
            FROM redemption_history WHERE account_id = $1
            ORDER BY redeemed_at DESC
            ",
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let account_id: String = row.get("account_id");
                let request_id: String = row.get("request_id");
                let redeemed_at: String = row.get("redeemed_at");
                Ok(RedemptionHistoryEntry {
                    id: parse_uuid(&id)?,
                    account_id: parse_uuid(&account_id)?,
                    request_id: parse_uuid(&request_id)?,
                    points_redeemed: row.get("points_redeemed"),
                    redeemed_at: parse_timestamp(&redeemed_at)?,
                })
            })
            .collect()
    }
}

async fn fetch_request(
    conn: &mut SqliteConnection,
    request_id: Uuid,
) -> AppResult<Option<RedemptionRequest>> {
    let query = format!("SELECT {REQUEST_COLUMNS} FROM redemption_requests WHERE id = $1");
    sqlx::query(&query)
        .bind(request_id.to_string())
        .fetch_optional(conn)
        .await?
        .as_ref()
        .map(row_to_request)
        .transpose()
}

fn row_to_request(row: &SqliteRow) -> AppResult<RedemptionRequest> {
    let id: String = row.get("id");
    let account_id: String = row.get("account_id");
    let requested_at: String = row.get("requested_at");
    let status: String = row.get("status");

    Ok(RedemptionRequest {
        id: parse_uuid(&id)?,
        account_id: parse_uuid(&account_id)?,
        username: row.get("username"),
        points_requested: row.get("points_requested"),
        payout_destination: row.get("payout_destination"),
        requested_at: parse_timestamp(&requested_at)?,
        status: parse_enum(&status)?,
        resolved_at: parse_optional_timestamp(row.get("resolved_at"))?,
        resolved_by: parse_optional_uuid(row.get("resolved_by"))?,
    })
}
