// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile provisioning.
//!
//! A profile is created on first sight of a subject id with role `free` and
//! afterwards only receives null-coalescing contact updates. The role is
//! changed exclusively by [`upgrade_to_pro`].

use chrono::{DateTime, Utc};

use crate::auth::{AuthenticatedUser, Role};
use crate::storage::{InsertOutcome, ProfileRepository, Store, StoreResult, UserProfile};

/// Contact details taken from the verified claim set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Contact {
    pub fn from_user(user: &AuthenticatedUser) -> Self {
        let (first_name, last_name) = user.names();
        Self {
            email: user.email(),
            first_name,
            last_name,
        }
    }
}

/// Get-or-create the profile for `user_id`, merging newly observed contact
/// details into an existing one.
///
/// A failed merge write is logged and the profile as read is returned.
pub fn ensure_profile(
    store: &Store,
    user_id: &str,
    contact: &Contact,
    now: DateTime<Utc>,
) -> StoreResult<UserProfile> {
    let repo = ProfileRepository::new(store);

    let existing = match repo.get(user_id)? {
        Some(profile) => profile,
        None => {
            let fresh = UserProfile::new(
                user_id,
                contact.email.as_str(),
                contact.first_name.as_str(),
                contact.last_name.as_str(),
                now,
            );
            match repo.insert_if_absent(&fresh)? {
                InsertOutcome::Created(profile) => {
                    tracing::info!(user_id = %user_id, "Profile created");
                    return Ok(profile);
                }
                // Lost a concurrent first insert; merge into the winner's row
                InsertOutcome::Existing(profile) => profile,
            }
        }
    };

    let mut preview = existing.clone();
    if !preview.merge_contact(&contact.email, &contact.first_name, &contact.last_name) {
        return Ok(existing);
    }

    match repo.merge_contact(
        user_id,
        &contact.email,
        &contact.first_name,
        &contact.last_name,
        now,
    ) {
        Ok(Some(merged)) => Ok(merged),
        Ok(None) => Ok(existing),
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Profile merge failed; returning stored profile");
            Ok(existing)
        }
    }
}

/// Move `user_id` to the `pro` role, creating the profile first if needed.
pub fn upgrade_to_pro(
    store: &Store,
    user_id: &str,
    contact: &Contact,
    billing_customer_id: Option<&str>,
    now: DateTime<Utc>,
) -> StoreResult<UserProfile> {
    let template = UserProfile::new(
        user_id,
        contact.email.as_str(),
        contact.first_name.as_str(),
        contact.last_name.as_str(),
        now,
    );
    let profile =
        ProfileRepository::new(store).upsert_role(&template, Role::Pro, billing_customer_id, now)?;
    tracing::info!(user_id = %user_id, role = %profile.role, "Profile upgraded");
    Ok(profile)
}
