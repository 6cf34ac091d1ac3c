// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Subscription roles and their habit quotas.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Subscription role stored on a user profile.
///
/// ## Quotas
///
/// - `Free` - may own 1 habit
/// - `Pro` - may own 5 habits
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Default plan for every new profile
    #[default]
    Free,
    /// Paid plan
    Pro,
}

impl Role {
    /// Maximum number of habits an owner with this role may hold.
    pub fn habit_quota(&self) -> usize {
        match self {
            Role::Free => 1,
            Role::Pro => 5,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Free => write!(f, "free"),
            Role::Pro => write!(f, "pro"),
        }
    }
}
