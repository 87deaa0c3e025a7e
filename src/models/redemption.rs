// ABOUTME: Redemption request lifecycle and personal redemption history entries
// ABOUTME: Requests start pending and move once to approved or rejected
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::progression::currency_value;

/// Redemption request status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    /// Awaiting an administrator
    Pending,
    /// Paid out
    Approved,
    /// Declined
    Rejected,
}

impl RedemptionStatus {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Terminal states accept no further transitions
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for RedemptionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedemptionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::invalid_input(format!(
                "Invalid redemption status: {s}"
            ))),
        }
    }
}

/// Administrator decision on a pending request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionDecision {
    /// Approve the payout
    Approve,
    /// Decline the payout
    Reject,
}

impl RedemptionDecision {
    /// Status the request moves to
    #[must_use]
    pub const fn resulting_status(self) -> RedemptionStatus {
        match self {
            Self::Approve => RedemptionStatus::Approved,
            Self::Reject => RedemptionStatus::Rejected,
        }
    }
}

/// Cash-out request reviewed by an administrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionRequest {
    /// Request id
    pub id: Uuid,
    /// Requesting account
    pub account_id: Uuid,
    /// Username at request time
    pub username: String,
    /// Points debited for the request
    pub points_requested: i64,
    /// Where to send the payout, e.g. a UPI id
    pub payout_destination: String,
    /// Request instant
    pub requested_at: DateTime<Utc>,
    /// Lifecycle status
    pub status: RedemptionStatus,
    /// Resolution instant
    pub resolved_at: Option<DateTime<Utc>>,
    /// Resolving administrator
    pub resolved_by: Option<Uuid>,
}

impl RedemptionRequest {
    /// Payout amount in currency units, display only
    #[must_use]
    pub fn currency_value(&self) -> f64 {
        currency_value(self.points_requested)
    }
}

/// Personal log line written when points are redeemed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionHistoryEntry {
    /// Entry id
    pub id: Uuid,
    /// Owner
    pub account_id: Uuid,
    /// Request this entry belongs to
    pub request_id: Uuid,
    /// Points redeemed
    pub points_redeemed: i64,
    /// Redemption instant
    pub redeemed_at: DateTime<Utc>,
}
