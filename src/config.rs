// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup (a `.env`
//! file is honoured). Inconsistent settings abort startup with a
//! [`ConfigError`] instead of falling back to a weaker mode.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `aura.redb` | `./data` |
//! | `AUTH_ISSUER_MATCH` | Substring the `iss` claim must contain | `supabase` |
//! | `AUTH_SIGNATURE_MODE` | `hs256`, `jwks` or `trust-unverified` | inferred |
//! | `JWT_SECRET` | HS256 shared secret | - |
//! | `JWKS_URL` | JWKS endpoint for asymmetric keys | - |
//! | `JWKS_CACHE_TTL_SECS` | How long fetched keys are reused | `300` |
//! | `DIRECTORY_URL` | Identity directory base URL; enables the existence check | disabled |
//! | `DIRECTORY_API_KEY` | Directory service key | required with `DIRECTORY_URL` |
//! | `DIRECTORY_TIMEOUT_MS` | Directory call timeout | `3000` |
//! | `DIRECTORY_FAILURE_POLICY` | `fail-open` or `fail-closed` | required with `DIRECTORY_URL` |
//! | `UPGRADE_SECRET` | Shared secret for `PUT /api/user/upgrade` | endpoint disabled |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated origins | `http://localhost:3000,http://localhost:5173` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; both set means HTTPS | plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! When `AUTH_SIGNATURE_MODE` is unset the mode is `hs256` if `JWT_SECRET`
//! is set, else `jwks` if `JWKS_URL` is set, else `trust-unverified`.

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{Authenticator, DirectoryClient, FailurePolicy, JwksManager, SignatureMode};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const AUTH_ISSUER_MATCH_ENV: &str = "AUTH_ISSUER_MATCH";
pub const AUTH_SIGNATURE_MODE_ENV: &str = "AUTH_SIGNATURE_MODE";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWKS_URL_ENV: &str = "JWKS_URL";
pub const JWKS_CACHE_TTL_SECS_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const DIRECTORY_URL_ENV: &str = "DIRECTORY_URL";
pub const DIRECTORY_API_KEY_ENV: &str = "DIRECTORY_API_KEY";
pub const DIRECTORY_TIMEOUT_MS_ENV: &str = "DIRECTORY_TIMEOUT_MS";
pub const DIRECTORY_FAILURE_POLICY_ENV: &str = "DIRECTORY_FAILURE_POLICY";
pub const UPGRADE_SECRET_ENV: &str = "UPGRADE_SECRET";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DATABASE_FILE: &str = "aura.redb";
pub const DEFAULT_ISSUER_MATCH: &str = "supabase";
pub const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_DIRECTORY_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_CORS_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("{0} requires {1}")]
    Requires(&'static str, &'static str),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Signature verification as configured, before any client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureSetting {
    Hs256 { secret: String },
    Jwks { url: String },
    TrustUnverified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySettings {
    pub url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub policy: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub issuer_match: String,
    pub signature: SignatureSetting,
    pub jwks_cache_ttl: Duration,
    pub directory: Option<DirectorySettings>,
    pub upgrade_secret: Option<String>,
    pub cors_allowed_origins: Vec<String>,
    pub tls: Option<TlsPaths>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source. Blank values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match var(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: PORT_ENV,
                value: raw,
                reason: "expected a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let signature = match var(AUTH_SIGNATURE_MODE_ENV) {
            Some(mode) => match mode.to_lowercase().as_str() {
                "hs256" => SignatureSetting::Hs256 {
                    secret: var(JWT_SECRET_ENV).ok_or(ConfigError::Requires(
                        "AUTH_SIGNATURE_MODE=hs256",
                        JWT_SECRET_ENV,
                    ))?,
                },
                "jwks" => SignatureSetting::Jwks {
                    url: var(JWKS_URL_ENV)
                        .ok_or(ConfigError::Requires("AUTH_SIGNATURE_MODE=jwks", JWKS_URL_ENV))?,
                },
                "trust-unverified" => SignatureSetting::TrustUnverified,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: AUTH_SIGNATURE_MODE_ENV,
                        value: mode,
                        reason: "expected hs256, jwks or trust-unverified",
                    })
                }
            },
            None => match (var(JWT_SECRET_ENV), var(JWKS_URL_ENV)) {
                (Some(secret), _) => SignatureSetting::Hs256 { secret },
                (None, Some(url)) => SignatureSetting::Jwks { url },
                (None, None) => SignatureSetting::TrustUnverified,
            },
        };

        let jwks_cache_ttl = match var(JWKS_CACHE_TTL_SECS_ENV) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: JWKS_CACHE_TTL_SECS_ENV,
                        value: raw,
                        reason: "expected a positive number of seconds",
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECS),
        };

        let directory = match var(DIRECTORY_URL_ENV) {
            None => None,
            Some(url) => {
                let api_key = var(DIRECTORY_API_KEY_ENV)
                    .ok_or(ConfigError::Requires(DIRECTORY_URL_ENV, DIRECTORY_API_KEY_ENV))?;
                let raw_policy = var(DIRECTORY_FAILURE_POLICY_ENV).ok_or(ConfigError::Requires(
                    DIRECTORY_URL_ENV,
                    DIRECTORY_FAILURE_POLICY_ENV,
                ))?;
                let policy = FailurePolicy::parse(&raw_policy).ok_or(ConfigError::Invalid {
                    var: DIRECTORY_FAILURE_POLICY_ENV,
                    value: raw_policy.clone(),
                    reason: "expected fail-open or fail-closed",
                })?;
                let timeout_ms = match var(DIRECTORY_TIMEOUT_MS_ENV) {
                    Some(raw) => match raw.parse::<u64>() {
                        Ok(ms) if ms > 0 => ms,
                        _ => {
                            return Err(ConfigError::Invalid {
                                var: DIRECTORY_TIMEOUT_MS_ENV,
                                value: raw,
                                reason: "expected a positive number of milliseconds",
                            })
                        }
                    },
                    None => DEFAULT_DIRECTORY_TIMEOUT_MS,
                };
                Some(DirectorySettings {
                    url,
                    api_key,
                    timeout: Duration::from_millis(timeout_ms),
                    policy,
                })
            }
        };

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Requires(TLS_CERT_PATH_ENV, TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Requires(TLS_KEY_PATH_ENV, TLS_CERT_PATH_ENV)),
        };

        let cors_allowed_origins = var(CORS_ALLOWED_ORIGINS_ENV)
            .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_dir: PathBuf::from(var(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            issuer_match: var(AUTH_ISSUER_MATCH_ENV).unwrap_or_else(|| DEFAULT_ISSUER_MATCH.to_string()),
            signature,
            jwks_cache_ttl,
            directory,
            upgrade_secret: var(UPGRADE_SECRET_ENV),
            cors_allowed_origins,
            tls,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    /// Build the request authenticator described by this configuration.
    pub fn build_authenticator(&self) -> Result<Authenticator, ConfigError> {
        let mode = match &self.signature {
            SignatureSetting::Hs256 { secret } => SignatureMode::Hs256 {
                secret: secret.as_bytes().to_vec(),
            },
            SignatureSetting::Jwks { url } => {
                let manager = JwksManager::new(url.as_str())?.with_cache_ttl(self.jwks_cache_ttl);
                tracing::info!(
                    jwks_url = manager.jwks_url(),
                    cache_ttl_secs = self.jwks_cache_ttl.as_secs(),
                    "Verifying token signatures against JWKS"
                );
                SignatureMode::Jwks(manager)
            }
            SignatureSetting::TrustUnverified => {
                tracing::warn!(
                    "Token signatures are NOT verified (trust-unverified mode); set JWT_SECRET or JWKS_URL to enable verification"
                );
                SignatureMode::TrustUnverified
            }
        };

        let mut authenticator = Authenticator::new(self.issuer_match.as_str(), mode);
        if let Some(directory) = &self.directory {
            let client = DirectoryClient::new(
                directory.url.as_str(),
                directory.api_key.as_str(),
                directory.timeout,
                directory.policy,
            )?;
            tracing::info!(
                timeout_ms = client.timeout().as_millis() as u64,
                policy = client.policy().as_str(),
                "Directory existence check enabled"
            );
            authenticator = authenticator.with_directory(client);
        }
        Ok(authenticator)
    }
}
