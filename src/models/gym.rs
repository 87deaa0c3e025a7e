// ABOUTME: Gym model owned by a gym-owner account
// ABOUTME: A gym's id equals its owner's account id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gym registered by a gym owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gym {
    /// Gym id, same as the owner's account id
    pub id: Uuid,
    /// Gym name
    pub name: String,
    /// Owning account
    pub owner_id: Uuid,
    /// Street address
    pub address: Option<String>,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

/// Gym as listed in the administrator overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GymSummary {
    /// The gym
    #[serde(flatten)]
    pub gym: Gym,
    /// Owner's username
    pub owner_name: String,
    /// Members excluding the owner
    pub member_count: i64,
}
