// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All JSON uses camelCase
//! field names to match the web client.
//!
//! ## Model Categories
//!
//! - **Login**: wallet provisioning on sign-in
//! - **Profile**: role lookup and plan upgrade
//! - **Habits**: creation requests (the habit itself is
//!   [`Habit`](crate::storage::Habit))

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::storage::{UserProfile, WalletRecord};

// =============================================================================
// Login
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Must equal the authenticated subject id
    pub user_id: String,
    /// Informational; the email on record comes from the token
    #[serde(default)]
    pub email: String,
}

/// Public view of a wallet. The private key is never included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    pub user_id: String,
    /// Compressed SEC1 public key, hex
    pub public_key: String,
    /// `0x` + 40 hex characters
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl From<WalletRecord> for WalletView {
    fn from(wallet: WalletRecord) -> Self {
        Self {
            user_id: wallet.user_id,
            public_key: wallet.public_key,
            address: wallet.address,
            created_at: wallet.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<WalletView>,
}

// =============================================================================
// Profile
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            role: profile.role,
            first_name: profile.first_name,
            last_name: profile.last_name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    /// Billing provider customer id
    #[serde(default)]
    pub customer_id: Option<String>,
}

// =============================================================================
// Habits
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateHabitRequest {
    pub name: String,
}
