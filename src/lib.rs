// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Aura habit server
//!
//! HTTP backend for the Aura habit tracker: resolves callers from
//! identity-provider tokens, provisions one profile and one wallet per user,
//! and tracks habits under a plan-based quota with once-per-day progress.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token trust policy and caller extraction
//! - `services` - Profile, wallet and habit operations
//! - `storage` - Embedded redb database and repositories

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
