// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `profiles`: user_id → serialized UserProfile
//! - `wallets`: user_id → serialized WalletRecord
//! - `habits`: habit_id → serialized Habit
//! - `habit_owner_index`: composite key (owner|!created_at|habit_id) → habit_id
//!
//! redb runs one write transaction at a time, so every read-then-write
//! sequence done inside a single write transaction is serializable. The
//! repositories rely on this for unique inserts, quota checks and the
//! once-per-day progress rule.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadTransaction, TableDefinition, WriteTransaction};

// =============================================================================
// Table Definitions
// =============================================================================

/// user_id → serialized UserProfile (JSON bytes).
pub(crate) const PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");

/// user_id → serialized WalletRecord (JSON bytes).
pub(crate) const WALLETS: TableDefinition<&str, &[u8]> = TableDefinition::new("wallets");

/// habit_id → serialized Habit (JSON bytes).
pub(crate) const HABITS: TableDefinition<&str, &[u8]> = TableDefinition::new("habits");

/// Index: composite key → habit_id.
/// Key format: `len(owner) | owner | !created_at_be | habit_id` for newest-first scans.
pub(crate) const HABIT_OWNER_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("habit_owner_index");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of an insert that must not overwrite an existing row.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome<T> {
    /// The row was written by this call
    Created(T),
    /// A row already existed under the key; it is returned unchanged
    Existing(T),
}

impl<T> InsertOutcome<T> {
    pub fn was_created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }
}

// =============================================================================
// Store
// =============================================================================

/// Shared handle to the embedded database.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PROFILES)?;
            let _ = write_txn.open_table(WALLETS)?;
            let _ = write_txn.open_table(HABITS)?;
            let _ = write_txn.open_table(HABIT_OWNER_INDEX)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Database opened");
        Ok(Self { db: Arc::new(db) })
    }

    pub(crate) fn begin_write(&self) -> StoreResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    pub(crate) fn begin_read(&self) -> StoreResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    /// Verify the database answers a read transaction.
    pub fn health_check(&self) -> StoreResult<()> {
        let read_txn = self.begin_read()?;
        let _ = read_txn.open_table(PROFILES)?;
        Ok(())
    }
}

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Prefix shared by every index entry of one owner.
///
/// The owner is length-prefixed so no owner's prefix is a prefix of another's.
/// The length is a full-width `u64`; a narrower field would wrap for long ids.
pub(crate) fn owner_prefix(owner_user_id: &str) -> Vec<u8> {
    let owner = owner_user_id.as_bytes();
    let mut prefix = Vec::with_capacity(8 + owner.len());
    prefix.extend_from_slice(&(owner.len() as u64).to_be_bytes());
    prefix.extend_from_slice(owner);
    prefix
}

/// Build a composite key for the habit_owner_index table.
///
/// The inverted timestamp makes a forward scan return newest habits first.
pub(crate) fn habit_index_key(owner_user_id: &str, created_at_micros: i64, habit_id: &str) -> Vec<u8> {
    let mut key = owner_prefix(owner_user_id);
    key.reserve(8 + habit_id.len());
    key.extend_from_slice(&(!(created_at_micros as u64)).to_be_bytes());
    key.extend_from_slice(habit_id.as_bytes());
    key
}
