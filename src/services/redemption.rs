// ABOUTME: Two-phase cash redemption: eligibility checks and debit, then admin resolution
// ABOUTME: Rejections can credit the debited points back depending on ledger policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::AccountContext;
use crate::config::LedgerConfig;
use crate::constants::ledger::MINIMUM_REDEEM_POINTS;
use crate::database::{retry_transaction, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{
    AccountSnapshot, RedemptionDecision, RedemptionHistoryEntry, RedemptionRequest,
    SubscriptionTier,
};
use crate::notifications::AccountEvents;
use crate::permissions::{Capabilities, Operation};

/// Result of a successful redemption request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionReceipt {
    /// The pending request
    pub request: RedemptionRequest,
    /// Account state after the debit
    pub account: AccountSnapshot,
}

/// Redemption workflow service
#[derive(Clone)]
pub struct RedemptionWorkflow {
    database: Database,
    events: AccountEvents,
    offset: FixedOffset,
    refund_on_reject: bool,
}

impl RedemptionWorkflow {
    /// Create the workflow service
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if the day offset is out of range
    pub fn new(database: Database, events: AccountEvents, config: &LedgerConfig) -> AppResult<Self> {
        Ok(Self {
            database,
            events,
            offset: config.day_offset()?,
            refund_on_reject: config.refund_on_reject,
        })
    }

    /// Request a redemption now
    ///
    /// # Errors
    ///
    /// See [`Self::request_redemption_at`]
    pub async fn request_redemption(
        &self,
        ctx: &AccountContext,
        points: i64,
        payout_destination: &str,
    ) -> AppResult<RedemptionReceipt> {
        self.request_redemption_at(ctx, points, payout_destination, Utc::now())
            .await
    }

    /// Request a redemption at `now`
    ///
    /// Checks run in order: gold tier, the minimum amount, then the balance.
    ///
    /// # Errors
    ///
    /// Returns `TierRestricted`, `BelowMinimum`, `InsufficientBalance` or
    /// `InvalidInput` for a blank payout destination. Nothing is written on
    /// any failure.
    #[instrument(skip(self, payout_destination), fields(account.id = %ctx.account_id))]
    pub async fn request_redemption_at(
        &self,
        ctx: &AccountContext,
        points: i64,
        payout_destination: &str,
        now: DateTime<Utc>,
    ) -> AppResult<RedemptionReceipt> {
        Capabilities::require_role(ctx.role, Operation::RequestRedemption)?;
        let account = self.database.accounts().require_account(ctx.account_id).await?;

        Capabilities::check(account.role, account.subscription_tier, Operation::RequestRedemption)?;
        if points < MINIMUM_REDEEM_POINTS {
            return Err(AppError::below_minimum(points));
        }
        if points > account.points {
            return Err(AppError::insufficient_balance(points, account.points));
        }
        let destination = payout_destination.trim();
        if destination.is_empty() {
            return Err(AppError::invalid_input("A payout destination is required"));
        }

        let redemptions = self.database.redemptions();
        let (request, account) = retry_transaction(
            || {
                redemptions.create_request(
                    ctx.account_id,
                    points,
                    destination,
                    SubscriptionTier::Gold,
                    now,
                )
            },
            self.database.max_retries(),
        )
        .await?;

        info!(
            account.id = %account.id,
            request.id = %request.id,
            points = points,
            balance = account.points,
            "Redemption requested"
        );
        let snapshot = AccountSnapshot::from_account(&account, now, self.offset);
        self.events.publish(&snapshot).await;
        Ok(RedemptionReceipt {
            request,
            account: snapshot,
        })
    }

    /// Resolve a pending request now
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_redemption_at`]
    pub async fn resolve_redemption(
        &self,
        ctx: &AccountContext,
        request_id: Uuid,
        decision: RedemptionDecision,
    ) -> AppResult<RedemptionRequest> {
        self.resolve_redemption_at(ctx, request_id, decision, Utc::now())
            .await
    }

    /// Approve or reject a pending request at `now`
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for non-administrators, `ResourceNotFound`
    /// for unknown requests and `NotPending` for resolved ones
    #[instrument(skip(self), fields(admin.id = %ctx.account_id, request.id = %request_id))]
    pub async fn resolve_redemption_at(
        &self,
        ctx: &AccountContext,
        request_id: Uuid,
        decision: RedemptionDecision,
        now: DateTime<Utc>,
    ) -> AppResult<RedemptionRequest> {
        Capabilities::require_role(ctx.role, Operation::ResolveRedemption)?;

        let redemptions = self.database.redemptions();
        let refund = self.refund_on_reject;
        let resolved = retry_transaction(
            || redemptions.resolve_request(request_id, decision, ctx.account_id, refund, now),
            self.database.max_retries(),
        )
        .await
        .inspect_err(|e| warn!(error.code = ?e.code, "Redemption resolution failed"))?;

        info!(
            request.id = %resolved.request.id,
            account.id = %resolved.request.account_id,
            status = %resolved.request.status,
            refunded = resolved.refunded_account.is_some(),
            "Redemption resolved"
        );
        if let Some(account) = &resolved.refunded_account {
            self.events
                .publish(&AccountSnapshot::from_account(account, now, self.offset))
                .await;
        }
        Ok(resolved.request)
    }

    /// Pending requests, newest first
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for non-administrators
    pub async fn list_pending_redemptions(
        &self,
        ctx: &AccountContext,
    ) -> AppResult<Vec<RedemptionRequest>> {
        Capabilities::require_role(ctx.role, Operation::ListPendingRedemptions)?;
        self.database.redemptions().list_pending().await
    }

    /// The caller's own requests, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn my_requests(&self, ctx: &AccountContext) -> AppResult<Vec<RedemptionRequest>> {
        self.database
            .redemptions()
            .list_requests_for(ctx.account_id)
            .await
    }

    /// The caller's redemption history, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn history(&self, ctx: &AccountContext) -> AppResult<Vec<RedemptionHistoryEntry>> {
        self.database.redemptions().list_history(ctx.account_id).await
    }
}
