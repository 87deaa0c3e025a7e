// ABOUTME: Integration tests for registration, login, gyms, subscriptions and plans
// ABOUTME: Verifies role and tier gates around member progress and plan assignment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use common::{
    context_of, create_admin, create_test_resources, register_member, register_owner, set_streak,
    set_tier, TEST_PASSWORD,
};
use level_up_fitness::{
    errors::ErrorCode,
    models::{PlanSource, Role, SubscriptionTier},
    services::{AssignPlan, RegisterMember, UpdateGym, UpdateProfile},
};

const WORKOUT: &str = "Warm up properly\n\
    - Push-ups [20pts] (3x15)\n\
    - Plank (3x 45s)\n\
    - Burpees [30pts] (4x10)";

#[tokio::test]
async fn test_member_registration_defaults() -> Result<()> {
    let resources = create_test_resources().await?;
    let session = register_member(&resources, "jinwoo", None).await?;

    assert_eq!(session.account.role, Role::User);
    assert_eq!(session.account.subscription_tier, SubscriptionTier::Bronze);
    assert_eq!(session.account.goal, "Not Set");
    assert_eq!(session.account.points, 0);
    assert_eq!(session.account.level, 1);
    assert_eq!(session.account.streak, 0);

    let ctx = resources.auth.validate_token(&session.token)?;
    assert_eq!(ctx.account_id, session.account.account_id);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_is_rejected_case_insensitively() -> Result<()> {
    let resources = create_test_resources().await?;
    register_member(&resources, "jinwoo", None).await?;

    let err = resources
        .accounts
        .register_user(RegisterMember {
            username: "impostor".to_owned(),
            email: "JINWOO@example.com".to_owned(),
            password: TEST_PASSWORD.to_owned(),
            gym_id: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);
    Ok(())
}

#[tokio::test]
async fn test_registration_into_unknown_gym() -> Result<()> {
    let resources = create_test_resources().await?;
    let err = register_member(&resources, "lost", Some(uuid::Uuid::new_v4()))
        .await
        .unwrap_err();
    let err = err.downcast::<level_up_fitness::errors::AppError>()?;
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    Ok(())
}

#[tokio::test]
async fn test_login() -> Result<()> {
    let resources = create_test_resources().await?;
    let registered = register_member(&resources, "jinah", None).await?;

    let session = resources
        .accounts
        .login(" Jinah@Example.com ", TEST_PASSWORD)
        .await?;
    assert_eq!(session.account.account_id, registered.account.account_id);

    for (email, password) in [("jinah@example.com", "wrong-password"), ("nobody@example.com", TEST_PASSWORD)] {
        let err = resources.accounts.login(email, password).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthInvalid);
        assert_eq!(err.message, "Invalid email or password");
    }
    Ok(())
}

#[tokio::test]
async fn test_gym_owner_registration_and_roster() -> Result<()> {
    let resources = create_test_resources().await?;
    let (owner, gym) = register_owner(&resources, "goto").await?;

    assert_eq!(owner.account.role, Role::GymOwner);
    assert_eq!(owner.account.subscription_tier, SubscriptionTier::GymFree);
    assert_eq!(owner.account.goal, "Manage Gym");
    assert_eq!(gym.owner_id, owner.account.account_id);
    assert_eq!(owner.account.gym_id, Some(gym.id));

    register_member(&resources, "alpha", Some(gym.id)).await?;
    register_member(&resources, "bravo", Some(gym.id)).await?;
    register_member(&resources, "outsider", None).await?;

    let members = resources.accounts.list_gym_members(&context_of(&owner)).await?;
    let names: Vec<_> = members.iter().map(|m| m.username.as_str()).collect();
    assert_eq!(names, vec!["alpha", "bravo"]);

    let gyms = resources.accounts.list_gyms().await?;
    assert_eq!(gyms.len(), 1);

    let admin = create_admin(&resources).await?;
    let summaries = resources.accounts.admin_gyms(&admin).await?;
    assert_eq!(summaries[0].member_count, 2);
    assert_eq!(summaries[0].owner_name, "goto");
    Ok(())
}

#[tokio::test]
async fn test_member_progress_visibility() -> Result<()> {
    let resources = create_test_resources().await?;
    let (owner, gym) = register_owner(&resources, "goto").await?;
    let (rival, _) = register_owner(&resources, "rival").await?;
    let member = register_member(&resources, "alpha", Some(gym.id)).await?;
    let other = register_member(&resources, "bravo", None).await?;
    let member_id = member.account.account_id;

    resources
        .ledger
        .complete_quest(&context_of(&member), vec!["Run".into()], 40)
        .await?;

    let progress = resources
        .accounts
        .member_progress(&context_of(&owner), member_id)
        .await?;
    assert_eq!(progress.account.points, 40);
    assert_eq!(progress.workouts.len(), 1);

    let admin = create_admin(&resources).await?;
    assert!(resources.accounts.member_progress(&admin, member_id).await.is_ok());

    for ctx in [context_of(&rival), context_of(&other)] {
        let err = resources
            .accounts
            .member_progress(&ctx, member_id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
    Ok(())
}

#[tokio::test]
async fn test_subscription_changes_stay_within_role_family() -> Result<()> {
    let resources = create_test_resources().await?;
    let admin = create_admin(&resources).await?;
    let member = register_member(&resources, "jinho", None).await?;
    let (owner, _) = register_owner(&resources, "goto").await?;

    let upgraded = resources
        .accounts
        .update_subscription(&admin, member.account.account_id, SubscriptionTier::Gold)
        .await?;
    assert_eq!(upgraded.subscription_tier, SubscriptionTier::Gold);

    let err = resources
        .accounts
        .update_subscription(&admin, owner.account.account_id, SubscriptionTier::Gold)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = resources
        .accounts
        .update_subscription(&context_of(&member), member.account.account_id, SubscriptionTier::Gold)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    Ok(())
}

#[tokio::test]
async fn test_admin_bootstrap_is_idempotent() -> Result<()> {
    let resources = create_test_resources().await?;
    let first = create_admin(&resources).await?;
    let second = create_admin(&resources).await?;
    assert_eq!(first.account_id, second.account_id);

    let accounts = resources.accounts.admin_accounts(&first).await?;
    assert_eq!(accounts.iter().filter(|a| a.role == Role::Admin).count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_plan_assignment_and_todays_quest() -> Result<()> {
    let resources = create_test_resources().await?;
    let (owner, gym) = register_owner(&resources, "goto").await?;
    let member = register_member(&resources, "alpha", Some(gym.id)).await?;
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let date = now.date_naive();

    let plan = resources
        .plans
        .assign_plan(
            &context_of(&owner),
            AssignPlan {
                member_id: member.account.account_id,
                date,
                workout_plan: Some(WORKOUT.to_owned()),
                diet_plan: Some("High protein".to_owned()),
                source: PlanSource::Manual,
            },
        )
        .await?;
    assert_eq!(plan.assigned_by, owner.account.account_id);

    let today = resources.plans.todays_plan_at(&context_of(&member), now).await?;
    assert_eq!(today.date, date);
    assert_eq!(today.exercises.len(), 3);
    assert_eq!(today.exercises[0].name, "Push-ups");
    assert_eq!(today.exercises[1].duration.as_deref(), Some("45s"));
    assert_eq!(today.total_points, 60);

    let tomorrow = resources
        .plans
        .todays_plan_at(&context_of(&member), now + chrono::Duration::days(1))
        .await?;
    assert!(tomorrow.plan.is_none());
    assert_eq!(tomorrow.total_points, 0);
    Ok(())
}

#[tokio::test]
async fn test_generated_plans_require_gym_prime() -> Result<()> {
    let resources = create_test_resources().await?;
    let (owner, gym) = register_owner(&resources, "goto").await?;
    let member = register_member(&resources, "alpha", Some(gym.id)).await?;
    let input = AssignPlan {
        member_id: member.account.account_id,
        date: Utc::now().date_naive(),
        workout_plan: Some(WORKOUT.to_owned()),
        diet_plan: None,
        source: PlanSource::Generated,
    };

    let err = resources
        .plans
        .assign_plan(&context_of(&owner), input.clone())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TierRestricted);

    set_tier(&resources, owner.account.account_id, SubscriptionTier::GymPrime).await?;
    let plan = resources.plans.assign_plan(&context_of(&owner), input).await?;
    assert_eq!(plan.source, PlanSource::Generated);
    Ok(())
}

#[tokio::test]
async fn test_plans_only_for_own_gym_members() -> Result<()> {
    let resources = create_test_resources().await?;
    let (owner, _) = register_owner(&resources, "goto").await?;
    let stranger = register_member(&resources, "stranger", None).await?;

    let err = resources
        .plans
        .assign_plan(
            &context_of(&owner),
            AssignPlan {
                member_id: stranger.account.account_id,
                date: Utc::now().date_naive(),
                workout_plan: Some(WORKOUT.to_owned()),
                diet_plan: None,
                source: PlanSource::Manual,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    Ok(())
}

#[tokio::test]
async fn test_profile_goal_can_be_set_once() -> Result<()> {
    let resources = create_test_resources().await?;
    let member = register_member(&resources, "jinwoo", None).await?;
    let ctx = context_of(&member);

    let updated = resources
        .accounts
        .update_profile(
            &ctx,
            UpdateProfile {
                username: Some("  Shadow Monarch ".to_owned()),
                goal: Some("Build Muscle".to_owned()),
            },
        )
        .await?;
    assert_eq!(updated.username, "Shadow Monarch");
    assert_eq!(updated.goal, "Build Muscle");

    let err = resources
        .accounts
        .update_profile(
            &ctx,
            UpdateProfile {
                username: None,
                goal: Some("Lose Weight".to_owned()),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    // The username can still change, and re-sending the current goal is accepted.
    let renamed = resources
        .accounts
        .update_profile(
            &ctx,
            UpdateProfile {
                username: Some("Jinwoo".to_owned()),
                goal: Some("Build Muscle".to_owned()),
            },
        )
        .await?;
    assert_eq!(renamed.username, "Jinwoo");
    assert_eq!(renamed.goal, "Build Muscle");
    Ok(())
}

#[tokio::test]
async fn test_profile_update_validation() -> Result<()> {
    let resources = create_test_resources().await?;
    let ctx = context_of(&register_member(&resources, "jinah", None).await?);

    for input in [
        UpdateProfile::default(),
        UpdateProfile {
            username: Some("   ".to_owned()),
            goal: None,
        },
        UpdateProfile {
            username: None,
            goal: Some("Become S-Rank".to_owned()),
        },
    ] {
        let err = resources.accounts.update_profile(&ctx, input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
    assert_eq!(resources.ledger.snapshot(&ctx).await?.goal, "Not Set");
    Ok(())
}

#[tokio::test]
async fn test_owner_updates_own_gym() -> Result<()> {
    let resources = create_test_resources().await?;
    let (owner, gym) = register_owner(&resources, "goto").await?;
    let member = register_member(&resources, "alpha", Some(gym.id)).await?;

    let updated = resources
        .accounts
        .update_gym(
            &context_of(&owner),
            UpdateGym {
                name: " Hunters Guild ".to_owned(),
                address: Some("12 Gate Road".to_owned()),
            },
        )
        .await?;
    assert_eq!(updated.id, gym.id);
    assert_eq!(updated.name, "Hunters Guild");
    assert_eq!(updated.address.as_deref(), Some("12 Gate Road"));
    assert_eq!(resources.accounts.list_gyms().await?[0].name, "Hunters Guild");

    let err = resources
        .accounts
        .update_gym(
            &context_of(&owner),
            UpdateGym {
                name: "  ".to_owned(),
                address: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = resources
        .accounts
        .update_gym(
            &context_of(&member),
            UpdateGym {
                name: "Stolen Gym".to_owned(),
                address: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    Ok(())
}

#[tokio::test]
async fn test_streak_leaderboard() -> Result<()> {
    let resources = create_test_resources().await?;
    let (owner, _) = register_owner(&resources, "goto").await?;
    set_streak(&resources, owner.account.account_id, 99).await?;
    for (name, streak) in [("alpha", 4), ("bravo", 12), ("charlie", 7), ("delta", 7), ("echo", 1)] {
        let member = register_member(&resources, name, None).await?;
        set_streak(&resources, member.account.account_id, streak).await?;
    }

    let top = resources.accounts.leaderboard(None).await?;
    let names: Vec<_> = top.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, vec!["bravo", "charlie", "delta"]);
    assert_eq!(top[0].streak, 12);

    assert_eq!(resources.accounts.leaderboard(Some(1)).await?.len(), 1);
    assert_eq!(resources.accounts.leaderboard(Some(0)).await?.len(), 1);
    assert_eq!(resources.accounts.leaderboard(Some(500)).await?.len(), 5);
    Ok(())
}

#[tokio::test]
async fn test_admin_gym_roster() -> Result<()> {
    let resources = create_test_resources().await?;
    let admin = create_admin(&resources).await?;
    let (owner, gym) = register_owner(&resources, "goto").await?;
    register_member(&resources, "alpha", Some(gym.id)).await?;
    register_member(&resources, "outsider", None).await?;

    let members = resources.accounts.admin_gym_members(&admin, gym.id).await?;
    let names: Vec<_> = members.iter().map(|m| m.username.as_str()).collect();
    assert_eq!(names, vec!["alpha"]);

    let err = resources
        .accounts
        .admin_gym_members(&admin, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let err = resources
        .accounts
        .admin_gym_members(&context_of(&owner), gym.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    Ok(())
}
