// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token trust policy.
//!
//! Checks run in a fixed order and the first failure is reported:
//!
//! 1. `Authorization: Bearer <token>` present and well-formed
//! 2. payload decodes to a claim set
//! 3. `exp` present and not in the past
//! 4. `sub` present and non-empty
//! 5. `iss` contains the configured identity-provider marker
//! 6. signature, according to the configured [`SignatureMode`]
//! 7. directory existence, when a [`DirectoryClient`] is configured

use axum::http::HeaderValue;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use super::claims::{AuthenticatedUser, ClaimSet};
use super::directory::{DirectoryClient, DirectoryLookup, FailurePolicy};
use super::error::AuthError;
use super::jwks::JwksManager;

/// How token signatures are treated.
///
/// `TrustUnverified` is a deliberate deployment choice (for example when an
/// upstream gateway has already verified the token), never a silent fallback.
#[derive(Clone)]
pub enum SignatureMode {
    /// HMAC-SHA256 with a shared secret
    Hs256 { secret: Vec<u8> },
    /// Asymmetric keys from the provider's JWKS endpoint
    Jwks(JwksManager),
    /// Signatures are not checked
    TrustUnverified,
}

impl SignatureMode {
    pub fn name(&self) -> &'static str {
        match self {
            SignatureMode::Hs256 { .. } => "hs256",
            SignatureMode::Jwks(_) => "jwks",
            SignatureMode::TrustUnverified => "trust-unverified",
        }
    }
}

impl std::fmt::Debug for SignatureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves a bearer token to an [`AuthenticatedUser`].
#[derive(Clone)]
pub struct Authenticator {
    issuer_match: String,
    signature: SignatureMode,
    directory: Option<DirectoryClient>,
}

impl Authenticator {
    pub fn new(issuer_match: impl Into<String>, signature: SignatureMode) -> Self {
        Self {
            issuer_match: issuer_match.into(),
            signature,
            directory: None,
        }
    }

    /// Enable the remote existence check.
    pub fn with_directory(mut self, directory: DirectoryClient) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn signature_mode(&self) -> &SignatureMode {
        &self.signature
    }

    /// `"hs256"`, `"jwks"` or `"trust-unverified"`.
    pub fn signature_mode_name(&self) -> &'static str {
        self.signature.name()
    }

    pub fn directory(&self) -> Option<&DirectoryClient> {
        self.directory.as_ref()
    }

    /// Run the full policy, starting from the raw `Authorization` header.
    pub async fn authenticate_header(
        &self,
        header: Option<&HeaderValue>,
        now: i64,
    ) -> Result<AuthenticatedUser, AuthError> {
        let token = bearer_token(header)?;
        self.authenticate(token, now).await
    }

    /// Run checks 2 through 7 on an already extracted token.
    pub async fn authenticate(&self, token: &str, now: i64) -> Result<AuthenticatedUser, AuthError> {
        let claims = ClaimSet::decode(token)?;

        match claims.expiration() {
            Some(exp) if exp >= now => {}
            _ => return Err(AuthError::TokenExpired),
        }

        let user_id = match claims.subject() {
            Some(sub) if !sub.is_empty() => sub.to_string(),
            _ => return Err(AuthError::MissingSubject),
        };

        if !claims
            .issuer()
            .is_some_and(|iss| iss.contains(&self.issuer_match))
        {
            return Err(AuthError::InvalidIssuer);
        }

        self.verify_signature(token).await?;

        if let Some(directory) = &self.directory {
            self.check_directory(directory, &user_id).await?;
        }

        Ok(AuthenticatedUser::new(user_id, claims))
    }

    async fn verify_signature(&self, token: &str) -> Result<(), AuthError> {
        let (key, algorithm) = match &self.signature {
            SignatureMode::TrustUnverified => return Ok(()),
            SignatureMode::Hs256 { secret } => (DecodingKey::from_secret(secret), Algorithm::HS256),
            SignatureMode::Jwks(jwks) => {
                let header = decode_header(token).map_err(|_| AuthError::InvalidSignature)?;
                let lookup = match &header.kid {
                    Some(kid) => jwks.get_decoding_key(kid).await,
                    None => jwks.get_any_decoding_key().await,
                };
                lookup.map_err(|e| {
                    tracing::warn!(error = %e, "No usable JWKS key for token");
                    AuthError::InvalidSignature
                })?
            }
        };

        // Time and issuer were checked on the claim set already
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<serde_json::Value>(token, &key, &validation)
            .map(|_| ())
            .map_err(|e| {
                tracing::debug!(error = %e, mode = self.signature.name(), "Signature rejected");
                AuthError::InvalidSignature
            })
    }

    async fn check_directory(
        &self,
        directory: &DirectoryClient,
        user_id: &str,
    ) -> Result<(), AuthError> {
        match directory.lookup(user_id).await {
            DirectoryLookup::Exists => Ok(()),
            DirectoryLookup::NotFound => Err(AuthError::UserNotExists),
            DirectoryLookup::Unavailable(reason) => match directory.policy() {
                FailurePolicy::FailClosed => {
                    tracing::error!(user_id = %user_id, error = %reason, "Directory check failed, rejecting");
                    Err(AuthError::DirectoryError(reason))
                }
                FailurePolicy::FailOpen => {
                    tracing::warn!(user_id = %user_id, error = %reason, "Directory check failed, accepting (fail-open)");
                    Ok(())
                }
            },
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = header
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::ClaimsError;
    use axum::{extract::Path, http::StatusCode, routing::get, Router};
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use axum::Json;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use rsa::pkcs1::EncodeRsaPrivateKey;
    use rsa::traits::PublicKeyParts;
    use rsa::RsaPrivateKey;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, OnceLock};
    use std::time::Duration;

    const NOW: i64 = 1_800_000_000;
    const ISSUER: &str = "https://project.supabase.co/auth/v1";
    const SECRET: &[u8] = b"super-secret-jwt-token";

    fn claims() -> Value {
        json!({
            "sub": "user_123",
            "exp": NOW + 3600,
            "iss": ISSUER,
            "email": "ada@example.com"
        })
    }

    fn signed(claims: &Value, secret: &[u8]) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn unsigned(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{body}.forged")
    }

    fn trusting() -> Authenticator {
        Authenticator::new("supabase", SignatureMode::TrustUnverified)
    }

    fn verifying() -> Authenticator {
        Authenticator::new(
            "supabase",
            SignatureMode::Hs256 {
                secret: SECRET.to_vec(),
            },
        )
    }

    async fn serve_directory() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/auth/v1/admin/users/{id}",
            get(|Path(id): Path<String>| async move {
                match id.as_str() {
                    "user_123" => StatusCode::OK,
                    "user_down" => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::NOT_FOUND,
                }
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn with_directory(base: &str, policy: FailurePolicy) -> Authenticator {
        let directory =
            DirectoryClient::new(base, "service-key", Duration::from_secs(2), policy).unwrap();
        trusting().with_directory(directory)
    }

    fn rsa_key(slot: &'static OnceLock<RsaPrivateKey>) -> &'static RsaPrivateKey {
        slot.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap())
    }

    fn published_key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        rsa_key(&KEY)
    }

    fn unpublished_key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        rsa_key(&KEY)
    }

    fn rsa_jwks(key: &RsaPrivateKey, kid: &str) -> Value {
        json!({
            "keys": [{
                "kty": "RSA",
                "kid": kid,
                "alg": "RS256",
                "use": "sig",
                "n": URL_SAFE_NO_PAD.encode(key.n().to_bytes_be()),
                "e": URL_SAFE_NO_PAD.encode(key.e().to_bytes_be())
            }]
        })
    }

    fn rs256_signed(claims: &Value, key: &RsaPrivateKey, kid: &str) -> String {
        let pem = key.to_pkcs1_pem(Default::default()).unwrap();
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        encode(&header, claims, &EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap()).unwrap()
    }

    /// JWKS endpoint that answers 503 while `available` is false.
    async fn serve_jwks(jwks: Value, available: Arc<AtomicBool>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/jwks",
            get(move || {
                let jwks = jwks.clone();
                let available = available.clone();
                async move {
                    if available.load(Ordering::SeqCst) {
                        Ok(Json(jwks))
                    } else {
                        Err(StatusCode::SERVICE_UNAVAILABLE)
                    }
                }
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/jwks")
    }

    fn jwks_mode(manager: JwksManager) -> Authenticator {
        Authenticator::new("supabase", SignatureMode::Jwks(manager))
    }

    async fn jwks_authenticator() -> Authenticator {
        let url = serve_jwks(rsa_jwks(published_key(), "k1"), Arc::new(AtomicBool::new(true))).await;
        jwks_mode(JwksManager::new(url).unwrap())
    }

    #[test]
    fn bearer_token_parsing() {
        assert!(matches!(bearer_token(None), Err(AuthError::MissingAuthHeader)));

        let basic = HeaderValue::from_static("Basic dXNlcjpwYXNz");
        assert!(matches!(
            bearer_token(Some(&basic)),
            Err(AuthError::InvalidAuthHeader)
        ));

        let empty = HeaderValue::from_static("Bearer   ");
        assert!(matches!(
            bearer_token(Some(&empty)),
            Err(AuthError::InvalidAuthHeader)
        ));

        let good = HeaderValue::from_static("Bearer abc.def.ghi");
        assert_eq!(bearer_token(Some(&good)).unwrap(), "abc.def.ghi");
    }

    #[tokio::test]
    async fn valid_token_resolves_subject() {
        let user = trusting().authenticate(&unsigned(&claims()), NOW).await.unwrap();
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.email(), "ada@example.com");
    }

    #[tokio::test]
    async fn header_flow_runs_full_policy() {
        let header = HeaderValue::from_str(&format!("Bearer {}", unsigned(&claims()))).unwrap();
        let user = trusting()
            .authenticate_header(Some(&header), NOW)
            .await
            .unwrap();
        assert_eq!(user.user_id, "user_123");

        assert!(matches!(
            trusting().authenticate_header(None, NOW).await,
            Err(AuthError::MissingAuthHeader)
        ));
    }

    #[tokio::test]
    async fn undecodable_token_is_claims_error() {
        assert!(matches!(
            trusting().authenticate("not-a-jwt", NOW).await,
            Err(AuthError::ClaimsParse(ClaimsError::MalformedToken))
        ));
    }

    #[tokio::test]
    async fn expired_token_wins_over_every_other_failure() {
        let expired = json!({"exp": NOW - 1, "iss": "https://evil.example.com"});
        assert!(matches!(
            verifying().authenticate(&unsigned(&expired), NOW).await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn missing_expiration_is_expired() {
        let mut c = claims();
        c.as_object_mut().unwrap().remove("exp");
        assert!(matches!(
            trusting().authenticate(&unsigned(&c), NOW).await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn expiration_equal_to_now_is_accepted() {
        let mut c = claims();
        c["exp"] = json!(NOW);
        assert!(trusting().authenticate(&unsigned(&c), NOW).await.is_ok());
    }

    #[tokio::test]
    async fn missing_or_empty_subject_rejected() {
        let mut c = claims();
        c["sub"] = json!("");
        assert!(matches!(
            trusting().authenticate(&unsigned(&c), NOW).await,
            Err(AuthError::MissingSubject)
        ));

        c.as_object_mut().unwrap().remove("sub");
        assert!(matches!(
            trusting().authenticate(&unsigned(&c), NOW).await,
            Err(AuthError::MissingSubject)
        ));
    }

    #[tokio::test]
    async fn foreign_or_missing_issuer_rejected() {
        let mut c = claims();
        c["iss"] = json!("https://accounts.example.com");
        assert!(matches!(
            trusting().authenticate(&unsigned(&c), NOW).await,
            Err(AuthError::InvalidIssuer)
        ));

        c.as_object_mut().unwrap().remove("iss");
        assert!(matches!(
            trusting().authenticate(&unsigned(&c), NOW).await,
            Err(AuthError::InvalidIssuer)
        ));
    }

    #[tokio::test]
    async fn hs256_mode_accepts_correct_signature() {
        let token = signed(&claims(), SECRET);
        let user = verifying().authenticate(&token, NOW).await.unwrap();
        assert_eq!(user.user_id, "user_123");
    }

    #[tokio::test]
    async fn hs256_mode_rejects_wrong_secret_and_forgeries() {
        let token = signed(&claims(), b"someone-elses-secret");
        assert!(matches!(
            verifying().authenticate(&token, NOW).await,
            Err(AuthError::InvalidSignature)
        ));

        assert!(matches!(
            verifying().authenticate(&unsigned(&claims()), NOW).await,
            Err(AuthError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn hs256_mode_rejects_unexpected_algorithm() {
        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::HS384),
            &claims(),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(matches!(
            verifying().authenticate(&token, NOW).await,
            Err(AuthError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn jwks_mode_accepts_token_signed_by_published_key() {
        let auth = jwks_authenticator().await;
        assert_eq!(auth.signature_mode_name(), "jwks");

        let token = rs256_signed(&claims(), published_key(), "k1");
        let user = auth.authenticate(&token, NOW).await.unwrap();
        assert_eq!(user.user_id, "user_123");
    }

    #[tokio::test]
    async fn jwks_mode_rejects_unknown_kid() {
        let auth = jwks_authenticator().await;
        let token = rs256_signed(&claims(), published_key(), "rotated-away");
        assert!(matches!(
            auth.authenticate(&token, NOW).await,
            Err(AuthError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn jwks_mode_rejects_token_signed_by_other_key() {
        let auth = jwks_authenticator().await;
        let token = rs256_signed(&claims(), unpublished_key(), "k1");
        assert!(matches!(
            auth.authenticate(&token, NOW).await,
            Err(AuthError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn jwks_mode_rejects_algorithm_other_than_the_key_is_for() {
        let auth = jwks_authenticator().await;
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some("k1".to_string());
        let token = encode(&header, &claims(), &EncodingKey::from_secret(SECRET)).unwrap();
        assert!(matches!(
            auth.authenticate(&token, NOW).await,
            Err(AuthError::InvalidSignature)
        ));

        assert!(matches!(
            auth.authenticate(&unsigned(&claims()), NOW).await,
            Err(AuthError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn jwks_fetch_failure_is_invalid_signature() {
        let auth = jwks_mode(JwksManager::new("http://127.0.0.1:1/jwks").unwrap());
        let token = rs256_signed(&claims(), published_key(), "k1");
        assert!(matches!(
            auth.authenticate(&token, NOW).await,
            Err(AuthError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn jwks_outage_serves_stale_keys() {
        let available = Arc::new(AtomicBool::new(true));
        let url = serve_jwks(rsa_jwks(published_key(), "k1"), available.clone()).await;
        // Zero TTL forces a refetch on every lookup
        let auth = jwks_mode(JwksManager::new(url.as_str()).unwrap().with_cache_ttl(Duration::ZERO));
        let token = rs256_signed(&claims(), published_key(), "k1");

        assert!(auth.authenticate(&token, NOW).await.is_ok());

        available.store(false, Ordering::SeqCst);
        assert_eq!(auth.authenticate(&token, NOW).await.unwrap().user_id, "user_123");

        let cold = jwks_mode(JwksManager::new(url).unwrap());
        assert!(matches!(
            cold.authenticate(&token, NOW).await,
            Err(AuthError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn trust_unverified_mode_is_explicit() {
        let auth = trusting();
        assert_eq!(auth.signature_mode().name(), "trust-unverified");
        assert!(auth.authenticate(&unsigned(&claims()), NOW).await.is_ok());
        assert_eq!(verifying().signature_mode().name(), "hs256");
    }

    #[tokio::test]
    async fn directory_confirms_existing_user() {
        let base = serve_directory().await;
        let auth = with_directory(&base, FailurePolicy::FailClosed);
        assert!(auth.authenticate(&unsigned(&claims()), NOW).await.is_ok());
    }

    #[tokio::test]
    async fn directory_not_found_rejects_regardless_of_policy() {
        let base = serve_directory().await;
        let mut c = claims();
        c["sub"] = json!("deleted_user");

        for policy in [FailurePolicy::FailOpen, FailurePolicy::FailClosed] {
            let auth = with_directory(&base, policy);
            assert!(matches!(
                auth.authenticate(&unsigned(&c), NOW).await,
                Err(AuthError::UserNotExists)
            ));
        }
    }

    #[tokio::test]
    async fn directory_outage_follows_failure_policy() {
        let base = serve_directory().await;
        let mut c = claims();
        c["sub"] = json!("user_down");
        let token = unsigned(&c);

        let closed = with_directory(&base, FailurePolicy::FailClosed);
        assert!(matches!(
            closed.authenticate(&token, NOW).await,
            Err(AuthError::DirectoryError(_))
        ));

        let open = with_directory(&base, FailurePolicy::FailOpen);
        assert_eq!(open.authenticate(&token, NOW).await.unwrap().user_id, "user_down");
    }

    #[tokio::test]
    async fn directory_not_called_when_earlier_check_fails() {
        // Unreachable directory with fail-closed would surface DirectoryError
        let auth = with_directory("http://127.0.0.1:1", FailurePolicy::FailClosed);
        let mut c = claims();
        c["iss"] = json!("https://accounts.example.com");
        assert!(matches!(
            auth.authenticate(&unsigned(&c), NOW).await,
            Err(AuthError::InvalidIssuer)
        ));
    }
}
