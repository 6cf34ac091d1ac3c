// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Habit lifecycle.
//!
//! ```text
//! New (0 days) -> Active (1..6 days) -> Completed (7 days)
//! ```
//!
//! - Creation is limited by the owner's role quota at creation time
//! - Progress advances at most once per UTC calendar day
//! - `days_completed` is capped at 7; advancing a completed habit on a new
//!   day only moves `last_tracked_date`

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::auth::Role;
use crate::storage::{Habit, HabitRepository, HabitUpdate, Store, StoreError, HABIT_TARGET_DAYS};

#[derive(Debug, thiserror::Error)]
pub enum HabitError {
    #[error("habit name must not be empty")]
    EmptyName,

    #[error("habit limit reached: the {role} plan allows {limit} habit(s)")]
    QuotaExceeded { role: Role, limit: usize },

    #[error("habit not found")]
    NotFound,

    #[error("habit already tracked today")]
    AlreadyTrackedToday,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Quota rule: an owner holding `existing` habits may add one more only while
/// below the role's quota.
pub fn check_quota(role: Role, existing: usize) -> Result<(), HabitError> {
    let limit = role.habit_quota();
    if existing >= limit {
        return Err(HabitError::QuotaExceeded { role, limit });
    }
    Ok(())
}

/// Apply one day of progress for `today`.
pub fn record_progress(habit: &mut Habit, today: NaiveDate) -> Result<(), HabitError> {
    if habit.last_tracked_date == Some(today) {
        return Err(HabitError::AlreadyTrackedToday);
    }
    habit.days_completed = habit.days_completed.saturating_add(1).min(HABIT_TARGET_DAYS);
    habit.completed = habit.days_completed >= HABIT_TARGET_DAYS;
    habit.last_tracked_date = Some(today);
    Ok(())
}

/// Create a habit for `owner_user_id` if the quota allows it.
pub fn create_habit(
    store: &Store,
    owner_user_id: &str,
    name: &str,
    now: DateTime<Utc>,
) -> Result<Habit, HabitError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HabitError::EmptyName);
    }

    let habit = Habit {
        id: Uuid::new_v4().to_string(),
        user_id: owner_user_id.to_string(),
        name: name.to_string(),
        days_completed: 0,
        completed: false,
        created_at: now,
        last_tracked_date: None,
    };

    let created = HabitRepository::new(store).create_guarded(&habit, check_quota)??;
    tracing::info!(user_id = %owner_user_id, habit_id = %created.id, "Habit created");
    Ok(created)
}

/// Advance `habit_id` by one day as of `as_of` (compared by UTC date).
pub fn advance_progress(
    store: &Store,
    habit_id: &str,
    owner_user_id: &str,
    as_of: DateTime<Utc>,
) -> Result<Habit, HabitError> {
    let today = as_of.date_naive();
    match HabitRepository::new(store).update_owned(habit_id, owner_user_id, |habit| {
        record_progress(habit, today)
    })? {
        HabitUpdate::Updated(habit) => {
            tracing::debug!(
                habit_id = %habit.id,
                days_completed = habit.days_completed,
                completed = habit.completed,
                "Habit progress recorded"
            );
            Ok(habit)
        }
        HabitUpdate::Rejected(e) => Err(e),
        HabitUpdate::NotFound => Err(HabitError::NotFound),
    }
}

/// All habits of the owner, newest first.
pub fn list_habits(store: &Store, owner_user_id: &str) -> Result<Vec<Habit>, HabitError> {
    Ok(HabitRepository::new(store).list_by_owner(owner_user_id)?)
}
