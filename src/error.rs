// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::{HabitError, WalletError};
use crate::storage::StoreError;

/// Message returned for every 500; the detail only goes to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Log `detail` and return an opaque 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Malformed or mistyped JSON bodies are a 400, whatever axum's own status.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::internal(e)
    }
}

impl From<WalletError> for ApiError {
    fn from(e: WalletError) -> Self {
        ApiError::internal(e)
    }
}

impl From<HabitError> for ApiError {
    fn from(e: HabitError) -> Self {
        match e {
            HabitError::EmptyName => ApiError::bad_request(e.to_string()),
            HabitError::QuotaExceeded { .. } => ApiError::forbidden(e.to_string()),
            HabitError::NotFound => ApiError::not_found("Habit not found"),
            HabitError::AlreadyTrackedToday => ApiError::conflict("Habit already tracked today"),
            HabitError::Store(e) => ApiError::internal(e),
        }
    }
}
