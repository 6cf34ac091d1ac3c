// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// Variants are listed in the order the authenticator checks them; the first
/// failing check is the one reported.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingAuthHeader,
    /// Header present but not `Bearer <token>`
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Token payload could not be decoded into a claim set
    #[error("Token claims could not be parsed: {0}")]
    ClaimsParse(#[from] super::claims::ClaimsError),
    /// `exp` missing or in the past
    #[error("Token has expired")]
    TokenExpired,
    /// `sub` missing or empty
    #[error("Token has no subject")]
    MissingSubject,
    /// `iss` missing or not from the configured identity provider
    #[error("Token issuer is invalid")]
    InvalidIssuer,
    /// Signature mismatch, unexpected algorithm, or no usable verification key
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// Directory could not be reached or answered unexpectedly
    #[error("Identity directory unavailable: {0}")]
    DirectoryError(String),
    /// Directory says the subject does not exist
    #[error("User does not exist")]
    UserNotExists,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::ClaimsParse(_) => "claims_parse_error",
            AuthError::TokenExpired => "token_expired",
            AuthError::MissingSubject => "missing_subject",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::DirectoryError(_) => "directory_error",
            AuthError::UserNotExists => "user_not_exists",
        }
    }

    /// Every authentication failure is a 401.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    /// Client-facing message. Directory transport detail stays in the logs.
    fn public_message(&self) -> String {
        match self {
            AuthError::DirectoryError(_) => "Identity directory unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(error_code = self.error_code(), error = %self, "Authentication rejected");

        let body = Json(AuthErrorBody {
            error: self.public_message(),
            error_code: self.error_code().to_string(),
        });
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_auth_header");
    }

    #[tokio::test]
    async fn directory_error_hides_transport_detail() {
        let response =
            AuthError::DirectoryError("connection refused at 10.0.0.7".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "directory_error");
        assert!(!body["error"].as_str().unwrap().contains("10.0.0.7"));
    }

    #[test]
    fn every_variant_is_unauthorized() {
        let errors = [
            AuthError::InvalidAuthHeader,
            AuthError::TokenExpired,
            AuthError::MissingSubject,
            AuthError::InvalidIssuer,
            AuthError::InvalidSignature,
            AuthError::UserNotExists,
        ];
        for error in errors {
            assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
        }
    }
}
