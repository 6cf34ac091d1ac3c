// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet repository.
//!
//! Wallets are keyed 1:1 by subject id and never modified after creation.
//!
//! ## Security
//!
//! - The private key is stored as base64 PKCS#8 DER
//! - Encryption at rest is provided by the data volume
//! - Private keys are NEVER returned via API

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use crate::storage::database::{InsertOutcome, Store, StoreResult, WALLETS};

/// Stored wallet record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRecord {
    /// Subject id that owns this wallet
    pub user_id: String,
    /// Compressed SEC1 public key, hex
    pub public_key: String,
    /// PKCS#8 DER private key, base64
    pub encrypted_private_key: String,
    /// `0x` + 40 hex chars
    pub address: String,
    pub created_at: DateTime<Utc>,
}

pub struct WalletRepository<'a> {
    store: &'a Store,
}

impl<'a> WalletRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn get(&self, user_id: &str) -> StoreResult<Option<WalletRecord>> {
        let read_txn = self.store.begin_read()?;
        let table = read_txn.open_table(WALLETS)?;
        let bytes = table.get(user_id)?.map(|v| v.value().to_vec());
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Store `wallet` unless the owner already has one. The existing wallet
    /// wins and is returned as [`InsertOutcome::Existing`].
    pub fn insert_if_absent(&self, wallet: &WalletRecord) -> StoreResult<InsertOutcome<WalletRecord>> {
        let write_txn = self.store.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(WALLETS)?;
            let existing = table.get(wallet.user_id.as_str())?.map(|v| v.value().to_vec());
            match existing {
                Some(bytes) => InsertOutcome::Existing(serde_json::from_slice(&bytes)?),
                None => {
                    let json = serde_json::to_vec(wallet)?;
                    table.insert(wallet.user_id.as_str(), json.as_slice())?;
                    InsertOutcome::Created(wallet.clone())
                }
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }
}
