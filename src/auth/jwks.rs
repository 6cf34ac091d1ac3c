// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! Used by the `jwks` signature mode, for identity providers that sign
//! access tokens with asymmetric keys.
//!
//! - Keys are cached with a configurable TTL
//! - A stale cache is served when a refresh fails

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Timeout for a single JWKS fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum JwksError {
    #[error("failed to fetch JWKS: {0}")]
    Fetch(String),

    #[error("no matching key in JWKS")]
    NoMatchingKey,

    #[error("unsupported JWK: {0}")]
    UnsupportedKey(String),
}

struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// JWKS manager with caching.
#[derive(Clone)]
pub struct JwksManager {
    jwks_url: String,
    cache_ttl: Duration,
    cache: Arc<RwLock<Option<CacheEntry>>>,
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new JWKS manager for the given endpoint.
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            client: reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?,
        })
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<JwkSet, JwksError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        match self.fetch_jwks().await {
            Ok(jwks) => {
                let mut cache = self.cache.write().await;
                *cache = Some(CacheEntry {
                    jwks: jwks.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(jwks)
            }
            Err(e) => {
                let cache = self.cache.read().await;
                match &*cache {
                    Some(entry) => {
                        tracing::warn!(error = %e, "JWKS refresh failed, serving stale keys");
                        Ok(entry.jwks.clone())
                    }
                    None => Err(e),
                }
            }
        }
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, JwksError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| JwksError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(JwksError::Fetch(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| JwksError::Fetch(e.to_string()))
    }

    /// Get a decoding key for the given key ID.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), JwksError> {
        let jwks = self.get_jwks().await?;

        let jwk = jwks
            .keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .ok_or(JwksError::NoMatchingKey)?;

        jwk_to_decoding_key(jwk)
    }

    /// Get the first usable decoding key (for tokens without kid).
    pub async fn get_any_decoding_key(&self) -> Result<(DecodingKey, Algorithm), JwksError> {
        let jwks = self.get_jwks().await?;

        jwks.keys
            .iter()
            .find_map(|jwk| jwk_to_decoding_key(jwk).ok())
            .ok_or(JwksError::NoMatchingKey)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), JwksError> {
        let jwks = self.fetch_jwks().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        });
        Ok(())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
    }
}

/// Convert a JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), JwksError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| JwksError::UnsupportedKey(format!("RSA key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                _ => Algorithm::RS256,
            };
            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| JwksError::UnsupportedKey(format!("EC key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };
            Ok((key, alg))
        }
        _ => Err(JwksError::UnsupportedKey("key type".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};
    use serde_json::json;

    async fn serve_jwks(body: serde_json::Value) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/.well-known/jwks.json",
            get(move || {
                let body = body.clone();
                async move { Json(body) }
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/.well-known/jwks.json")
    }

    #[test]
    fn custom_cache_ttl() {
        let manager = JwksManager::new("https://example.com/.well-known/jwks.json")
            .unwrap()
            .with_cache_ttl(Duration::from_secs(60));
        assert_eq!(manager.cache_ttl, Duration::from_secs(60));
        assert_eq!(manager.jwks_url(), "https://example.com/.well-known/jwks.json");
    }

    #[tokio::test]
    async fn cache_initially_empty() {
        let manager = JwksManager::new("https://example.com/.well-known/jwks.json").unwrap();
        assert!(!manager.is_cached().await);
    }

    #[test]
    fn symmetric_jwk_is_unsupported() {
        let jwk: Jwk = serde_json::from_value(json!({
            "kty": "oct",
            "k": "c2VjcmV0",
            "kid": "k1"
        }))
        .unwrap();
        assert!(matches!(
            jwk_to_decoding_key(&jwk),
            Err(JwksError::UnsupportedKey(_))
        ));
    }

    #[tokio::test]
    async fn fetch_populates_cache_and_matches_kid() {
        let url = serve_jwks(json!({
            "keys": [{"kty": "oct", "k": "c2VjcmV0", "kid": "k1"}]
        }))
        .await;
        let manager = JwksManager::new(url).unwrap();

        assert!(matches!(
            manager.get_decoding_key("other").await,
            Err(JwksError::NoMatchingKey)
        ));
        assert!(manager.is_cached().await);
        assert!(matches!(
            manager.get_decoding_key("k1").await,
            Err(JwksError::UnsupportedKey(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_fetch_error() {
        let manager = JwksManager::new("http://127.0.0.1:1/jwks.json").unwrap();
        assert!(matches!(
            manager.get_any_decoding_key().await,
            Err(JwksError::Fetch(_))
        ));
    }
}
