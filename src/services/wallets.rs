// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet provisioning.
//!
//! The generated key material is a stand-in, not production key custody:
//!
//! 1. Generate a random secp256k1 signing key
//! 2. `public_key` = compressed SEC1 point, hex
//! 3. `address` = `0x` + hex of the last 20 bytes of SHA-256 over the
//!    uncompressed point without its `0x04` prefix
//! 4. `encrypted_private_key` = PKCS#8 DER, base64 (the data volume provides
//!    encryption at rest)

use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use k256::ecdsa::SigningKey;
use k256::pkcs8::EncodePrivateKey;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::storage::{InsertOutcome, Store, StoreError, WalletRecord, WalletRepository};

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("failed to encode private key: {0}")]
    KeyEncoding(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create fresh wallet material for `user_id`.
pub fn generate_wallet(user_id: &str, now: DateTime<Utc>) -> Result<WalletRecord, WalletError> {
    let signing_key = SigningKey::random(&mut OsRng);
    let verifying_key = signing_key.verifying_key();

    let private_key_der = signing_key
        .to_pkcs8_der()
        .map_err(|e| WalletError::KeyEncoding(e.to_string()))?;

    let uncompressed = verifying_key.to_encoded_point(false);
    let digest = Sha256::digest(&uncompressed.as_bytes()[1..]);

    Ok(WalletRecord {
        user_id: user_id.to_string(),
        public_key: hex::encode(verifying_key.to_encoded_point(true).as_bytes()),
        encrypted_private_key: Base64::encode_string(private_key_der.as_bytes()),
        address: format!("0x{}", hex::encode(&digest[12..])),
        created_at: now,
    })
}

/// Return the user's wallet, creating it on first call.
///
/// The flag is `true` only for the call that actually stored the wallet.
pub fn ensure_wallet(
    store: &Store,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<(WalletRecord, bool), WalletError> {
    let repo = WalletRepository::new(store);
    if let Some(wallet) = repo.get(user_id)? {
        return Ok((wallet, false));
    }

    let candidate = generate_wallet(user_id, now)?;
    match repo.insert_if_absent(&candidate)? {
        InsertOutcome::Created(wallet) => {
            tracing::info!(user_id = %user_id, address = %wallet.address, "Wallet created");
            Ok((wallet, true))
        }
        InsertOutcome::Existing(wallet) => Ok((wallet, false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::pkcs8::DecodePrivateKey;
    use std::sync::Barrier;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn generated_material_has_expected_shape() {
        let wallet = generate_wallet("user_1", Utc::now()).unwrap();

        assert_eq!(wallet.address.len(), 42);
        assert!(wallet.address.starts_with("0x"));
        assert!(wallet.address[2..].chars().all(|c| c.is_ascii_hexdigit()));

        assert_eq!(wallet.public_key.len(), 66);
        assert!(wallet.public_key.starts_with("02") || wallet.public_key.starts_with("03"));

        let der = Base64::decode_vec(&wallet.encrypted_private_key).unwrap();
        let key = SigningKey::from_pkcs8_der(&der).unwrap();
        assert_eq!(
            hex::encode(key.verifying_key().to_encoded_point(true).as_bytes()),
            wallet.public_key
        );
    }

    #[test]
    fn generated_wallets_differ() {
        let a = generate_wallet("user_1", Utc::now()).unwrap();
        let b = generate_wallet("user_1", Utc::now()).unwrap();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn ensure_wallet_never_regenerates() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("test.redb")).unwrap();

        let (first, created) = ensure_wallet(&store, "user_1", Utc::now()).unwrap();
        assert!(created);

        for _ in 0..3 {
            let (again, created) = ensure_wallet(&store, "user_1", Utc::now()).unwrap();
            assert!(!created);
            assert_eq!(again, first);
        }
    }

    #[test]
    fn concurrent_first_logins_share_one_wallet() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("test.redb")).unwrap();
        let barrier = Barrier::new(16);

        let results: Vec<(WalletRecord, bool)> = thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        ensure_wallet(&store, "user_1", Utc::now()).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|(_, created)| *created).count(), 1);
        let stored = WalletRepository::new(&store).get("user_1").unwrap().unwrap();
        assert!(results.iter().all(|(wallet, _)| *wallet == stored));
    }
}
