// ABOUTME: Integration tests for the two-phase redemption workflow
// ABOUTME: Covers eligibility order, guarded debit, single resolution, refunds and live events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use futures_util::{future::join_all, StreamExt};
use common::{
    context_of, create_admin, create_file_resources, create_test_resources,
    create_test_resources_with, gold_member_with_points, register_member, set_points, set_tier,
};
use level_up_fitness::{
    config::LedgerConfig,
    errors::ErrorCode,
    models::{RedemptionDecision, RedemptionStatus, SubscriptionTier},
};

const UPI: &str = "jinwoo@upi";

#[tokio::test]
async fn test_gold_member_redemption_debits_and_queues() -> Result<()> {
    let resources = create_test_resources().await?;
    let ctx = gold_member_with_points(&resources, "jinwoo", 6000).await?;
    let admin = create_admin(&resources).await?;

    let receipt = resources.redemptions.request_redemption(&ctx, 5000, UPI).await?;
    assert_eq!(receipt.account.points, 1000);
    assert_eq!(receipt.account.level, 11);
    assert_eq!(receipt.request.status, RedemptionStatus::Pending);
    assert_eq!(receipt.request.points_requested, 5000);
    assert_eq!(receipt.request.username, "jinwoo");
    assert!((receipt.request.currency_value() - 50.0).abs() < f64::EPSILON);

    let pending = resources.redemptions.list_pending_redemptions(&admin).await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, receipt.request.id);

    let history = resources.redemptions.history(&ctx).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].points_redeemed, 5000);
    Ok(())
}

#[tokio::test]
async fn test_non_gold_tiers_are_restricted() -> Result<()> {
    let resources = create_test_resources().await?;
    let session = register_member(&resources, "jinah", None).await?;
    let ctx = context_of(&session);
    set_points(&resources, ctx.account_id, 9000).await?;

    for tier in [SubscriptionTier::Bronze, SubscriptionTier::Silver] {
        set_tier(&resources, ctx.account_id, tier).await?;
        let err = resources
            .redemptions
            .request_redemption(&ctx, 5000, UPI)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TierRestricted);
    }

    assert_eq!(resources.ledger.snapshot(&ctx).await?.points, 9000);
    assert!(resources.redemptions.my_requests(&ctx).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_tier_is_checked_before_amount() -> Result<()> {
    let resources = create_test_resources().await?;
    let ctx = context_of(&register_member(&resources, "kyunghye", None).await?);

    let err = resources
        .redemptions
        .request_redemption(&ctx, 10, UPI)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TierRestricted);
    Ok(())
}

#[tokio::test]
async fn test_amount_below_minimum() -> Result<()> {
    let resources = create_test_resources().await?;
    let ctx = gold_member_with_points(&resources, "hwang", 20_000).await?;

    let err = resources
        .redemptions
        .request_redemption(&ctx, 4999, UPI)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BelowMinimum);
    assert!(err.message.contains("5000"));
    assert_eq!(resources.ledger.snapshot(&ctx).await?.points, 20_000);
    Ok(())
}

#[tokio::test]
async fn test_amount_above_balance() -> Result<()> {
    let resources = create_test_resources().await?;
    let ctx = gold_member_with_points(&resources, "woo", 5500).await?;

    let err = resources
        .redemptions
        .request_redemption(&ctx, 6000, UPI)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientBalance);
    assert_eq!(resources.ledger.snapshot(&ctx).await?.points, 5500);
    Ok(())
}

#[tokio::test]
async fn test_blank_payout_destination() -> Result<()> {
    let resources = create_test_resources().await?;
    let ctx = gold_member_with_points(&resources, "minsung", 5000).await?;

    let err = resources
        .redemptions
        .request_redemption(&ctx, 5000, "   ")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(resources.ledger.snapshot(&ctx).await?.points, 5000);
    Ok(())
}

#[tokio::test]
async fn test_whole_balance_can_be_redeemed_once() -> Result<()> {
    let resources = create_test_resources().await?;
    let ctx = gold_member_with_points(&resources, "jongin", 5000).await?;

    let receipt = resources.redemptions.request_redemption(&ctx, 5000, UPI).await?;
    assert_eq!(receipt.account.points, 0);
    assert_eq!(receipt.account.level, 1);

    let err = resources
        .redemptions
        .request_redemption(&ctx, 5000, UPI)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientBalance);
    Ok(())
}

#[tokio::test]
async fn test_request_resolves_exactly_once() -> Result<()> {
    let resources = create_test_resources().await?;
    let ctx = gold_member_with_points(&resources, "cha", 6000).await?;
    let admin = create_admin(&resources).await?;
    let receipt = resources.redemptions.request_redemption(&ctx, 5000, UPI).await?;

    let approved = resources
        .redemptions
        .resolve_redemption(&admin, receipt.request.id, RedemptionDecision::Approve)
        .await?;
    assert_eq!(approved.status, RedemptionStatus::Approved);
    assert_eq!(approved.resolved_by, Some(admin.account_id));
    assert!(approved.resolved_at.is_some());

    let stored = resources
        .database
        .redemptions()
        .get_request(receipt.request.id)
        .await?
        .unwrap();
    assert_eq!(stored.status, RedemptionStatus::Approved);

    for decision in [RedemptionDecision::Approve, RedemptionDecision::Reject] {
        let err = resources
            .redemptions
            .resolve_redemption(&admin, receipt.request.id, decision)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotPending);
    }

    assert!(resources.redemptions.list_pending_redemptions(&admin).await?.is_empty());
    // Approval keeps the debit.
    assert_eq!(resources.ledger.snapshot(&ctx).await?.points, 1000);
    Ok(())
}

fn refunding() -> LedgerConfig {
    LedgerConfig {
        refund_on_reject: true,
        ..LedgerConfig::default()
    }
}

#[tokio::test]
async fn test_rejection_refunds_when_enabled() -> Result<()> {
    let resources = create_test_resources_with(refunding()).await?;
    let ctx = gold_member_with_points(&resources, "sungjin", 7000).await?;
    let admin = create_admin(&resources).await?;
    let receipt = resources.redemptions.request_redemption(&ctx, 5000, UPI).await?;

    let rejected = resources
        .redemptions
        .resolve_redemption(&admin, receipt.request.id, RedemptionDecision::Reject)
        .await?;
    assert_eq!(rejected.status, RedemptionStatus::Rejected);

    let snapshot = resources.ledger.snapshot(&ctx).await?;
    assert_eq!(snapshot.points, 7000);
    assert_eq!(snapshot.level, 71);

    let err = resources
        .redemptions
        .resolve_redemption(&admin, receipt.request.id, RedemptionDecision::Reject)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotPending);
    assert_eq!(resources.ledger.snapshot(&ctx).await?.points, 7000);
    Ok(())
}

#[tokio::test]
async fn test_rejection_keeps_debit_by_default() -> Result<()> {
    let resources = create_test_resources().await?;
    let ctx = gold_member_with_points(&resources, "sooho", 7000).await?;
    let admin = create_admin(&resources).await?;
    let receipt = resources.redemptions.request_redemption(&ctx, 5000, UPI).await?;

    resources
        .redemptions
        .resolve_redemption(&admin, receipt.request.id, RedemptionDecision::Reject)
        .await?;
    assert_eq!(resources.ledger.snapshot(&ctx).await?.points, 2000);
    Ok(())
}

#[tokio::test]
async fn test_only_admins_resolve_and_list() -> Result<()> {
    let resources = create_test_resources().await?;
    let ctx = gold_member_with_points(&resources, "yoonho", 6000).await?;
    let receipt = resources.redemptions.request_redemption(&ctx, 5000, UPI).await?;

    let err = resources
        .redemptions
        .resolve_redemption(&ctx, receipt.request.id, RedemptionDecision::Approve)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let err = resources
        .redemptions
        .list_pending_redemptions(&ctx)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let admin = create_admin(&resources).await?;
    let err = resources
        .redemptions
        .resolve_redemption(&admin, uuid::Uuid::new_v4(), RedemptionDecision::Approve)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    Ok(())
}

#[tokio::test]
async fn test_pending_listed_newest_first() -> Result<()> {
    let resources = create_test_resources().await?;
    let admin = create_admin(&resources).await?;
    let first = gold_member_with_points(&resources, "older", 5000).await?;
    let second = gold_member_with_points(&resources, "newer", 5000).await?;
    let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();

    let older = resources
        .redemptions
        .request_redemption_at(&first, 5000, UPI, start)
        .await?;
    let newer = resources
        .redemptions
        .request_redemption_at(&second, 5000, UPI, start + Duration::minutes(5))
        .await?;

    let pending = resources.redemptions.list_pending_redemptions(&admin).await?;
    let ids: Vec<_> = pending.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![newer.request.id, older.request.id]);
    Ok(())
}

#[tokio::test]
async fn test_subscribers_receive_snapshots() -> Result<()> {
    let resources = create_test_resources_with(refunding()).await?;
    let ctx = gold_member_with_points(&resources, "esil", 8000).await?;
    let admin = create_admin(&resources).await?;
    let mut receiver = resources.events.subscribe(ctx.account_id).await;
    assert_eq!(resources.events.subscriber_count(ctx.account_id).await, 1);

    let receipt = resources.redemptions.request_redemption(&ctx, 5000, UPI).await?;
    let debited = tokio::time::timeout(StdDuration::from_secs(1), receiver.recv()).await??;
    assert_eq!(debited.points, 3000);

    resources
        .redemptions
        .resolve_redemption(&admin, receipt.request.id, RedemptionDecision::Reject)
        .await?;
    let refunded = tokio::time::timeout(StdDuration::from_secs(1), receiver.recv()).await??;
    assert_eq!(refunded.points, 8000);
    Ok(())
}

#[tokio::test]
async fn test_dropped_streams_release_their_channel() -> Result<()> {
    let resources = create_test_resources().await?;
    let ctx = gold_member_with_points(&resources, "ahjin", 10_000).await?;

    let mut updates = Box::pin(resources.events.subscribe_stream(ctx.account_id).await);
    resources.redemptions.request_redemption(&ctx, 5000, UPI).await?;
    let first = tokio::time::timeout(StdDuration::from_secs(1), updates.next())
        .await?
        .unwrap();
    assert_eq!(first.points, 5000);

    drop(updates);
    resources.redemptions.request_redemption(&ctx, 5000, UPI).await?;
    assert_eq!(resources.events.subscriber_count(ctx.account_id).await, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_overspend() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let resources = create_file_resources(dir.path(), LedgerConfig::default()).await?;
    let ctx = gold_member_with_points(&resources, "beru", 12_000).await?;

    let attempts = (0..8).map(|_| {
        let resources = resources.clone();
        tokio::spawn(async move { resources.redemptions.request_redemption(&ctx, 5000, UPI).await })
    });
    let mut succeeded = 0;
    for outcome in join_all(attempts).await {
        match outcome? {
            Ok(_) => succeeded += 1,
            Err(err) => assert_eq!(err.code, ErrorCode::InsufficientBalance),
        }
    }

    assert_eq!(succeeded, 12_000 / 5000);
    let snapshot = resources.ledger.snapshot(&ctx).await?;
    assert_eq!(snapshot.points, 2000);
    assert_eq!(snapshot.level, 21);
    assert_eq!(resources.redemptions.my_requests(&ctx).await?.len(), 2);
    assert_eq!(resources.redemptions.history(&ctx).await?.len(), 2);
    Ok(())
}
