// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Resolves the caller of every `/api` route from an identity-provider JWT.
//!
//! ## Auth Flow
//!
//! 1. Frontend authenticates the user with the identity provider
//! 2. Frontend sends `Authorization: Bearer <access token>`
//! 3. Server:
//!    - Decodes the claim set without trusting it
//!    - Checks expiry, subject, and issuer
//!    - Verifies the signature (HS256 secret or JWKS), unless the deployment
//!      explicitly runs in `trust-unverified` mode
//!    - Optionally confirms the subject with the provider's user directory
//!    - Yields `sub` as the canonical `user_id`
//!
//! Email and display names are read from the same claim set for profile
//! provisioning; they are never taken from request bodies.

pub mod authenticator;
pub mod claims;
pub mod directory;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod roles;

pub use authenticator::{Authenticator, SignatureMode};
pub use claims::{AuthenticatedUser, ClaimSet, ClaimsError};
pub use directory::{DirectoryClient, FailurePolicy};
pub use error::AuthError;
pub use extractor::Auth;
pub use jwks::JwksManager;
pub use roles::Role;
