// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Extractor that runs the authenticator against the request's
/// `Authorization` header.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let user = state
            .authenticator
            .authenticate_header(parts.headers.get(AUTHORIZATION), Utc::now().timestamp())
            .await?;

        parts.extensions.insert(user.clone());
        Ok(Auth(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Authenticator, ClaimSet, SignatureMode};
    use crate::state::AppState;
    use crate::storage::Store;
    use axum::http::Request;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use tempfile::TempDir;

    fn create_test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Store::open(&temp_dir.path().join("test.redb")).expect("Failed to open store");
        let authenticator = Authenticator::new("supabase", SignatureMode::TrustUnverified);
        (AppState::new(store, authenticator), temp_dir)
    }

    fn create_test_jwt(user_id: &str) -> String {
        let header = r#"{"alg":"HS256","typ":"JWT"}"#;
        let claims = format!(
            r#"{{"sub":"{user_id}","exp":9999999999,"iss":"https://test.supabase.co/auth/v1"}}"#
        );
        format!(
            "{}.{}.fake_signature",
            URL_SAFE_NO_PAD.encode(header.as_bytes()),
            URL_SAFE_NO_PAD.encode(claims.as_bytes())
        )
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_jwt() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {}", create_test_jwt("user_123")))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, "user_123");
        assert!(parts.extensions.get::<AuthenticatedUser>().is_some());
    }

    #[tokio::test]
    async fn auth_extractor_reuses_earlier_result() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;
        parts
            .extensions
            .insert(AuthenticatedUser::new("user_from_earlier_layer", ClaimSet::default()));

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, "user_from_earlier_layer");
    }
}
