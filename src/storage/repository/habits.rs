// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Habit repository.
//!
//! Habits live in `habits` (id → JSON) with a secondary
//! `habit_owner_index` for per-owner listing and counting. Guarded writes
//! take a closure that runs inside the write transaction, so the guard sees
//! exactly the state the write is applied to.

use chrono::{DateTime, NaiveDate, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::profiles::UserProfile;
use crate::auth::Role;
use crate::storage::database::{
    habit_index_key, owner_prefix, Store, StoreResult, HABITS, HABIT_OWNER_INDEX, PROFILES,
};

/// Days needed to complete a habit.
pub const HABIT_TARGET_DAYS: u8 = 7;

/// A tracked habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    /// Owner subject id
    pub user_id: String,
    pub name: String,
    /// 0 to 7
    pub days_completed: u8,
    /// True exactly when `days_completed` is 7
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Calendar day (UTC) of the last successful progress update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tracked_date: Option<NaiveDate>,
}

/// Result of [`HabitRepository::update_owned`].
#[derive(Debug)]
pub enum HabitUpdate<E> {
    Updated(Habit),
    /// The closure refused the change; nothing was written
    Rejected(E),
    /// No habit with that id belongs to the owner
    NotFound,
}

pub struct HabitRepository<'a> {
    store: &'a Store,
}

impl<'a> HabitRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// All habits of `owner_user_id`, newest first.
    pub fn list_by_owner(&self, owner_user_id: &str) -> StoreResult<Vec<Habit>> {
        let read_txn = self.store.begin_read()?;
        let index = read_txn.open_table(HABIT_OWNER_INDEX)?;
        let habits = read_txn.open_table(HABITS)?;

        let prefix = owner_prefix(owner_user_id);
        let mut results = Vec::new();
        for entry in index.range(prefix.as_slice()..)? {
            let (key, habit_id) = entry?;
            if !key.value().starts_with(&prefix) {
                break;
            }
            let bytes = habits.get(habit_id.value())?.map(|v| v.value().to_vec());
            match bytes {
                Some(bytes) => results.push(serde_json::from_slice(&bytes)?),
                None => {
                    tracing::warn!(habit_id = %habit_id.value(), "Index entry without habit row");
                }
            }
        }
        Ok(results)
    }

    /// Insert `habit` if `guard` accepts the owner's current role and habit
    /// count. The role defaults to `free` when the owner has no profile.
    pub fn create_guarded<E>(
        &self,
        habit: &Habit,
        guard: impl FnOnce(Role, usize) -> Result<(), E>,
    ) -> StoreResult<Result<Habit, E>> {
        let write_txn = self.store.begin_write()?;
        let outcome = {
            let profiles = write_txn.open_table(PROFILES)?;
            let role = match profiles.get(habit.user_id.as_str())?.map(|v| v.value().to_vec()) {
                Some(bytes) => serde_json::from_slice::<UserProfile>(&bytes)?.role,
                None => Role::default(),
            };

            let mut index = write_txn.open_table(HABIT_OWNER_INDEX)?;
            let prefix = owner_prefix(&habit.user_id);
            let mut count = 0usize;
            for entry in index.range(prefix.as_slice()..)? {
                let (key, _) = entry?;
                if !key.value().starts_with(&prefix) {
                    break;
                }
                count += 1;
            }

            match guard(role, count) {
                Err(e) => Err(e),
                Ok(()) => {
                    let mut habits = write_txn.open_table(HABITS)?;
                    let json = serde_json::to_vec(habit)?;
                    habits.insert(habit.id.as_str(), json.as_slice())?;
                    let key = habit_index_key(&habit.user_id, habit.created_at.timestamp_micros(), &habit.id);
                    index.insert(key.as_slice(), habit.id.as_str())?;
                    Ok(habit.clone())
                }
            }
        };

        if outcome.is_ok() {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(outcome)
    }

    /// Load the habit `habit_id` owned by `owner_user_id`, let `apply` mutate
    /// it, and persist the result. A habit owned by someone else is reported
    /// as [`HabitUpdate::NotFound`].
    pub fn update_owned<E>(
        &self,
        habit_id: &str,
        owner_user_id: &str,
        apply: impl FnOnce(&mut Habit) -> Result<(), E>,
    ) -> StoreResult<HabitUpdate<E>> {
        let write_txn = self.store.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(HABITS)?;
            let existing = table.get(habit_id)?.map(|v| v.value().to_vec());
            let owned = match existing {
                Some(bytes) => {
                    let habit: Habit = serde_json::from_slice(&bytes)?;
                    (habit.user_id == owner_user_id).then_some(habit)
                }
                None => None,
            };

            match owned {
                None => HabitUpdate::NotFound,
                Some(mut habit) => match apply(&mut habit) {
                    Err(e) => HabitUpdate::Rejected(e),
                    Ok(()) => {
                        let json = serde_json::to_vec(&habit)?;
                        table.insert(habit_id, json.as_slice())?;
                        HabitUpdate::Updated(habit)
                    }
                },
            }
        };

        if matches!(outcome, HabitUpdate::Updated(_)) {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(outcome)
    }
}
