// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::SignatureMode;
use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Embedded database availability.
    pub storage: String,
    /// Active token signature mode (`hs256`, `jwks`, `trust-unverified`).
    pub signature_mode: String,
    /// JWKS key availability. Only present in `jwks` mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<String>,
    /// Whether the identity directory check is enabled.
    pub directory_check: bool,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn check_storage(state: &AppState) -> String {
    match state.store.health_check() {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Storage health check failed");
            "unavailable".to_string()
        }
    }
}

async fn check_jwks(state: &AppState) -> Option<String> {
    let SignatureMode::Jwks(manager) = state.authenticator.signature_mode() else {
        return None;
    };
    if manager.is_cached().await {
        return Some("ok".to_string());
    }
    match manager.refresh().await {
        Ok(()) => Some("ok".to_string()),
        Err(_) => Some("unavailable".to_string()),
    }
}

/// Health check endpoint handler.
///
/// Returns 200 if all checks pass, 503 if any check fails.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let storage = check_storage(&state);
    let jwks = check_jwks(&state).await;

    let all_ok = storage == "ok" && jwks.as_deref().map_or(true, |s| s == "ok");

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            storage,
            signature_mode: state.authenticator.signature_mode_name().to_string(),
            jwks,
            directory_check: state.authenticator.directory().is_some(),
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler. Same checks as `/health`.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}
