// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User profile endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{
    auth::Auth,
    error::ApiError,
    models::{ProfileResponse, UpgradeRequest},
    services::{ensure_profile, upgrade_to_pro, Contact},
    state::AppState,
};

/// Header carrying the shared upgrade secret.
pub const UPGRADE_SECRET_HEADER: &str = "x-upgrade-secret";

/// Get (or create) the caller's profile and role.
///
/// Email and names from the token are merged into the stored profile
/// without overwriting stored values with empty ones.
#[utoipa::path(
    get,
    path = "/api/user/role",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller's profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 500, description = "Persistence failure")
    )
)]
pub async fn get_user_role(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let contact = Contact::from_user(&user);
    let profile = ensure_profile(&state.store, &user.user_id, &contact, Utc::now())?;
    Ok(Json(profile.into()))
}

/// Upgrade the caller to the `pro` plan.
///
/// Called by the billing front end after payment is confirmed. Only enabled
/// when an upgrade secret is configured, and the request must present it in
/// `X-Upgrade-Secret`. The body is optional; without a JSON content type it
/// is treated as `{}`.
#[utoipa::path(
    put,
    path = "/api/user/upgrade",
    tag = "Users",
    request_body = UpgradeRequest,
    params(
        ("X-Upgrade-Secret" = String, Header, description = "Shared upgrade secret")
    ),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile after upgrade", body = ProfileResponse),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Upgrades disabled or secret mismatch"),
        (status = 500, description = "Persistence failure")
    )
)]
pub async fn upgrade_user(
    Auth(user): Auth,
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Option<Json<UpgradeRequest>>, JsonRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Some(expected) = state.upgrade_secret.as_deref() else {
        return Err(ApiError::forbidden("Plan upgrades are disabled"));
    };
    let presented = headers
        .get(UPGRADE_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !secret_matches(presented, expected) {
        tracing::warn!(user_id = %user.user_id, "Upgrade attempted with invalid secret");
        return Err(ApiError::forbidden("Invalid upgrade secret"));
    }

    let request = payload?.map(|Json(request)| request).unwrap_or_default();
    let customer_id = request
        .customer_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let contact = Contact::from_user(&user);
    let profile = upgrade_to_pro(&state.store, &user.user_id, &contact, customer_id, Utc::now())?;
    Ok(Json(profile.into()))
}

/// Compares digests in constant time so neither content nor length leaks.
fn secret_matches(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented.as_slice().ct_eq(expected.as_slice()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_comparison() {
        assert!(secret_matches("upgrade-s3cret", "upgrade-s3cret"));
        assert!(!secret_matches("upgrade-s3cre", "upgrade-s3cret"));
        assert!(!secret_matches("", "upgrade-s3cret"));
        assert!(!secret_matches("UPGRADE-S3CRET", "upgrade-s3cret"));
    }
}
