// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loosely-typed JWT claim set and the authenticated user built from it.
//!
//! The claim set is decoded from the token payload *without* any signature
//! check. Nothing read from it is trusted until the authenticator has run
//! its policy over it.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::{Map, Value};

/// Nested object where OAuth providers place profile fields.
const PROVIDER_METADATA_CLAIM: &str = "user_metadata";

/// Errors raised while decoding a token payload.
#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("token must have three dot-separated segments")]
    MalformedToken,

    #[error("token payload is not valid base64url: {0}")]
    Encoding(String),

    #[error("token payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("token payload is not a claim object")]
    NotAnObject,
}

/// Decoded, unverified JWT payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimSet {
    claims: Map<String, Value>,
}

impl ClaimSet {
    /// Decode the payload segment of a compact JWT.
    pub fn decode(token: &str) -> Result<Self, ClaimsError> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(ClaimsError::MalformedToken);
        };

        // Some issuers pad their segments even though RFC 7515 forbids it
        let bytes = Base64UrlUnpadded::decode_vec(payload.trim_end_matches('='))
            .map_err(|e| ClaimsError::Encoding(e.to_string()))?;

        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(claims) => Ok(Self { claims }),
            _ => Err(ClaimsError::NotAnObject),
        }
    }

    /// Build a claim set directly from a JSON object.
    pub fn from_map(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// `sub` claim, if it is a string.
    pub fn subject(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    /// `exp` claim as Unix seconds. Fractional timestamps are truncated.
    pub fn expiration(&self) -> Option<i64> {
        self.claims.get("exp").and_then(Value::as_f64).map(|exp| exp as i64)
    }

    /// `iss` claim, if it is a string.
    pub fn issuer(&self) -> Option<&str> {
        self.str_claim("iss")
    }

    /// `email` claim, or empty.
    pub fn email(&self) -> String {
        self.str_claim("email").unwrap_or_default().to_string()
    }

    /// First and last name, following provider fallbacks in order:
    ///
    /// 1. metadata `full_name`, then `name`, split on the first whitespace run
    /// 2. metadata `first_name`/`given_name` and `last_name`/`family_name`
    /// 3. the same individual fields at the top level, for whichever half is
    ///    still empty
    ///
    /// A combined name such as `"A B C"` yields `("A", "B C")`.
    pub fn names(&self) -> (String, String) {
        let metadata = self
            .claims
            .get(PROVIDER_METADATA_CLAIM)
            .and_then(Value::as_object);

        let mut first = String::new();
        let mut last = String::new();

        if let Some(metadata) = metadata {
            for combined in ["full_name", "name"] {
                if let Some(full) = non_blank(metadata, combined) {
                    return split_full_name(full);
                }
            }

            first = first_of(metadata, &["first_name", "given_name"]).unwrap_or_default();
            last = first_of(metadata, &["last_name", "family_name"]).unwrap_or_default();
        }

        if first.is_empty() {
            first = first_of(&self.claims, &["first_name", "given_name"]).unwrap_or_default();
        }
        if last.is_empty() {
            last = first_of(&self.claims, &["last_name", "family_name"]).unwrap_or_default();
        }

        (first, last)
    }

    fn str_claim(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }
}

fn non_blank<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

fn first_of(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| non_blank(object, key))
        .map(str::to_string)
}

fn split_full_name(full: &str) -> (String, String) {
    let full = full.trim();
    match full.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim_start().to_string()),
        None => (full.to_string(), String::new()),
    }
}

/// Caller identity resolved by the authenticator.
///
/// `user_id` is the only field the policy vouches for; the claim set is kept
/// so provisioning can read email and names without decoding the token again.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Canonical user ID (`sub` claim)
    pub user_id: String,

    /// Claims the user ID was read from
    pub claims: ClaimSet,
}

impl AuthenticatedUser {
    pub fn new(user_id: impl Into<String>, claims: ClaimSet) -> Self {
        Self {
            user_id: user_id.into(),
            claims,
        }
    }

    pub fn email(&self) -> String {
        self.claims.email()
    }

    pub fn names(&self) -> (String, String) {
        self.claims.names()
    }
}
