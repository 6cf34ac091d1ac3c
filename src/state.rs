// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::storage::Store;

/// Shared handler state. Cloned per request; holds no mutable data of its own.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub authenticator: Arc<Authenticator>,
    /// Enables `PUT /api/user/upgrade` when set
    pub upgrade_secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(store: Store, authenticator: Authenticator) -> Self {
        Self {
            store,
            authenticator: Arc::new(authenticator),
            upgrade_secret: None,
        }
    }

    pub fn with_upgrade_secret(mut self, secret: Option<String>) -> Self {
        self.upgrade_secret = secret.map(Arc::from);
        self
    }
}
