// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Role,
    models::{
        CreateHabitRequest, LoginRequest, LoginResponse, ProfileResponse, UpgradeRequest,
        WalletView,
    },
    state::AppState,
    storage::Habit,
};

pub mod habits;
pub mod health;
pub mod login;
pub mod users;

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let api_routes = Router::new()
        .route("/login", post(login::login))
        .route("/user/role", get(users::get_user_role))
        .route("/user/upgrade", put(users::upgrade_user))
        .route("/habits", get(habits::get_habits).post(habits::post_habit))
        .route("/habits/{habit_id}/progress", put(habits::put_habit_progress));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// CORS restricted to `origins`, with credentials. Unparsable origins are
/// skipped with a warning.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        login::login,
        users::get_user_role,
        users::upgrade_user,
        habits::get_habits,
        habits::post_habit,
        habits::put_habit_progress
    ),
    components(
        schemas(
            Habit,
            Role,
            LoginRequest,
            LoginResponse,
            WalletView,
            ProfileResponse,
            UpgradeRequest,
            CreateHabitRequest,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Sign-in and wallet provisioning"),
        (name = "Users", description = "Profile, role and plan upgrades"),
        (name = "Habits", description = "Habit tracking")
    )
)]
struct ApiDoc;
