// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage in a single redb file under `DATA_DIR`.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   aura.redb
//!     profiles            # subject id -> profile
//!     wallets             # subject id -> wallet (private key never exposed via API)
//!     habits              # habit id -> habit
//!     habit_owner_index   # owner | !created_at | habit id -> habit id
//! ```
//!
//! ## Important Notes
//!
//! - Every check-then-write runs inside one redb write transaction
//! - Encryption at rest is left to the mounted data volume

pub mod database;
pub mod repository;

pub use database::{InsertOutcome, Store, StoreError, StoreResult};
pub use repository::{
    Habit, HabitRepository, HabitUpdate, ProfileRepository, UserProfile, WalletRecord,
    WalletRepository, HABIT_TARGET_DAYS,
};
