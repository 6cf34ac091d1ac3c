// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the embedded database.
//!
//! Each repository borrows the [`Store`](super::Store) and owns the
//! transactions for one entity type.

pub mod habits;
pub mod profiles;
pub mod wallets;

pub use habits::{Habit, HabitRepository, HabitUpdate, HABIT_TARGET_DAYS};
pub use profiles::{ProfileRepository, UserProfile};
pub use wallets::{WalletRecord, WalletRepository};
