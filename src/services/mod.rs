// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Domain operations behind the HTTP handlers.
//!
//! - [`profiles`] - idempotent profile get-or-create and plan upgrades
//! - [`wallets`] - idempotent one-per-user wallet provisioning
//! - [`habits`] - quota-limited creation and once-per-day progress

pub mod habits;
pub mod profiles;
pub mod wallets;

pub use habits::{advance_progress, create_habit, list_habits, HabitError};
pub use profiles::{ensure_profile, upgrade_to_pro, Contact};
pub use wallets::{ensure_wallet, generate_wallet, WalletError};
