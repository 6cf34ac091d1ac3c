// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;

use axum_server::tls_rustls::RustlsConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aura_habit_server::{
    api::{cors_layer, router},
    config::{AppConfig, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    state::AppState,
    storage::Store,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().expect("Invalid configuration");
    tracing::info!(host = %config.host, port = config.port, "Loaded server configuration");

    let store = Store::open(&config.database_path()).expect("Failed to open database");
    store.health_check().expect("Database health check failed");

    let authenticator = config
        .build_authenticator()
        .expect("Failed to build authenticator");
    tracing::info!(
        signature_mode = authenticator.signature_mode_name(),
        issuer_match = %config.issuer_match,
        "Authentication configured"
    );
    if config.upgrade_secret.is_none() {
        tracing::info!("UPGRADE_SECRET not set; plan upgrade endpoint disabled");
    }

    let state = AppState::new(store, authenticator).with_upgrade_secret(config.upgrade_secret.clone());
    let app = router(state, cors_layer(&config.cors_allowed_origins));

    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );

    match &config.tls {
        Some(tls) => {
            // Install the ring crypto provider for rustls (must be done before any TLS operations)
            rustls::crypto::ring::default_provider()
                .install_default()
                .expect("Failed to install rustls crypto provider");

            let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .expect("Failed to load TLS certificate or key");

            tracing::info!(%addr, "Aura server listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await
                .expect("HTTPS server failed");
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .expect("Failed to bind to address");

            tracing::info!(%addr, "Aura server listening on http (docs at /docs)");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .expect("Server error");
        }
    }

    tracing::info!("Server stopped");
}

/// `LOG_FORMAT=json` switches to JSON lines; anything else is human-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
