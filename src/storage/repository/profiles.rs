// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile repository.
//!
//! One profile per subject id. The subject id is the table key, so the
//! insert-if-absent below cannot produce a second row for the same user.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::storage::database::{InsertOutcome, Store, StoreResult, PROFILES};

/// Stored user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Subject id from the identity provider
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    /// Billing provider customer id, recorded on upgrade
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A fresh `free` profile.
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role: Role::Free,
            first_name: first_name.into(),
            last_name: last_name.into(),
            billing_customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Null-coalescing merge: a non-empty incoming value replaces the stored
    /// one, an empty one leaves it alone. Returns whether anything changed.
    pub fn merge_contact(&mut self, email: &str, first_name: &str, last_name: &str) -> bool {
        let mut changed = false;
        for (field, incoming) in [
            (&mut self.email, email),
            (&mut self.first_name, first_name),
            (&mut self.last_name, last_name),
        ] {
            if !incoming.is_empty() && field.as_str() != incoming {
                *field = incoming.to_string();
                changed = true;
            }
        }
        changed
    }
}

pub struct ProfileRepository<'a> {
    store: &'a Store,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn get(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let read_txn = self.store.begin_read()?;
        let table = read_txn.open_table(PROFILES)?;
        let bytes = table.get(user_id)?.map(|v| v.value().to_vec());
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Insert `profile` unless a row already exists for its id, in which case
    /// the stored row is returned untouched.
    pub fn insert_if_absent(&self, profile: &UserProfile) -> StoreResult<InsertOutcome<UserProfile>> {
        let write_txn = self.store.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(PROFILES)?;
            let existing = table.get(profile.id.as_str())?.map(|v| v.value().to_vec());
            match existing {
                Some(bytes) => InsertOutcome::Existing(serde_json::from_slice(&bytes)?),
                None => {
                    let json = serde_json::to_vec(profile)?;
                    table.insert(profile.id.as_str(), json.as_slice())?;
                    InsertOutcome::Created(profile.clone())
                }
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    /// Apply [`UserProfile::merge_contact`] to the stored row.
    ///
    /// Returns `None` when no profile exists. The role is never touched.
    pub fn merge_contact(
        &self,
        user_id: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserProfile>> {
        let write_txn = self.store.begin_write()?;
        let merged = {
            let mut table = write_txn.open_table(PROFILES)?;
            let existing = table.get(user_id)?.map(|v| v.value().to_vec());
            match existing {
                None => None,
                Some(bytes) => {
                    let mut profile: UserProfile = serde_json::from_slice(&bytes)?;
                    if profile.merge_contact(email, first_name, last_name) {
                        profile.updated_at = now;
                        let json = serde_json::to_vec(&profile)?;
                        table.insert(user_id, json.as_slice())?;
                    }
                    Some(profile)
                }
            }
        };
        write_txn.commit()?;
        Ok(merged)
    }

    /// Set the role on the profile, creating it from `template` first when
    /// absent. A `Some` customer id replaces the stored one.
    pub fn upsert_role(
        &self,
        template: &UserProfile,
        role: Role,
        billing_customer_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<UserProfile> {
        let write_txn = self.store.begin_write()?;
        let profile = {
            let mut table = write_txn.open_table(PROFILES)?;
            let existing = table.get(template.id.as_str())?.map(|v| v.value().to_vec());
            let mut profile = match existing {
                Some(bytes) => serde_json::from_slice::<UserProfile>(&bytes)?,
                None => template.clone(),
            };
            profile.role = role;
            if let Some(customer_id) = billing_customer_id {
                profile.billing_customer_id = Some(customer_id.to_string());
            }
            profile.updated_at = now;
            let json = serde_json::to_vec(&profile)?;
            table.insert(template.id.as_str(), json.as_slice())?;
            profile
        };
        write_txn.commit()?;
        Ok(profile)
    }
}
