// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Remote identity-directory existence check.
//!
//! Confirms that a token's subject still exists at the identity provider
//! (`GET {base}/auth/v1/admin/users/{id}`). The call is bounded by a timeout
//! and what happens when the directory cannot answer is decided by an
//! explicit [`FailurePolicy`].

use std::time::Duration;

use reqwest::StatusCode;

/// What to do when the directory cannot give an authoritative answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Accept the caller and log the outage
    FailOpen,
    /// Reject the caller
    FailClosed,
}

impl FailurePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fail-open" => Some(FailurePolicy::FailOpen),
            "fail-closed" => Some(FailurePolicy::FailClosed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::FailOpen => "fail-open",
            FailurePolicy::FailClosed => "fail-closed",
        }
    }
}

/// Outcome of a directory lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryLookup {
    Exists,
    NotFound,
    /// Transport failure, timeout, or a non-authoritative status
    Unavailable(String),
}

/// HTTP client for the identity directory.
#[derive(Clone)]
pub struct DirectoryClient {
    base_url: String,
    api_key: String,
    timeout: Duration,
    policy: FailurePolicy,
    client: reqwest::Client,
}

impl DirectoryClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        policy: FailurePolicy,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            policy,
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the directory whether `user_id` exists.
    pub async fn lookup(&self, user_id: &str) -> DirectoryLookup {
        let mut url = match reqwest::Url::parse(&self.base_url) {
            Ok(url) => url,
            Err(e) => return DirectoryLookup::Unavailable(format!("invalid directory URL: {e}")),
        };
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments
                    .pop_if_empty()
                    .extend(["auth", "v1", "admin", "users", user_id]);
            }
            Err(()) => {
                return DirectoryLookup::Unavailable("directory URL cannot be a base".to_string())
            }
        }

        let response = match self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return DirectoryLookup::Unavailable(e.to_string()),
        };

        match response.status() {
            status if status.is_success() => DirectoryLookup::Exists,
            StatusCode::NOT_FOUND => DirectoryLookup::NotFound,
            status => DirectoryLookup::Unavailable(format!("HTTP {status} from directory")),
        }
    }
}
