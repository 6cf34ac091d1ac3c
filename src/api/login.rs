// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-in endpoint: provisions the caller's wallet exactly once.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;

use crate::{
    auth::Auth,
    error::ApiError,
    models::{LoginRequest, LoginResponse},
    services::ensure_wallet,
    state::AppState,
};

pub const WALLET_CREATED_MESSAGE: &str = "Wallet created successfully";
pub const WALLET_EXISTS_MESSAGE: &str = "User already has a wallet";

/// Record a sign-in and make sure the caller has a wallet.
///
/// The `userId` in the body must match the token subject.
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Wallet created or already present", body = LoginResponse),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "userId does not match the token subject"),
        (status = 500, description = "Persistence failure")
    )
)]
pub async fn login(
    Auth(user): Auth,
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;

    if request.user_id != user.user_id {
        tracing::warn!(user_id = %user.user_id, "Login userId does not match token subject");
        return Err(ApiError::forbidden("User ID mismatch"));
    }

    let (wallet, created) = ensure_wallet(&state.store, &user.user_id, Utc::now())?;
    let message = if created {
        WALLET_CREATED_MESSAGE
    } else {
        WALLET_EXISTS_MESSAGE
    };

    Ok(Json(LoginResponse {
        success: true,
        message: message.to_string(),
        wallet: Some(wallet.into()),
    }))
}
