// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Habit endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    auth::Auth,
    error::ApiError,
    models::CreateHabitRequest,
    services::{advance_progress, create_habit, list_habits},
    state::AppState,
    storage::Habit,
};

/// List the caller's habits, newest first. Always an array.
#[utoipa::path(
    get,
    path = "/api/habits",
    tag = "Habits",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller's habits", body = [Habit]),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 500, description = "Persistence failure")
    )
)]
pub async fn get_habits(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    Ok(Json(list_habits(&state.store, &user.user_id)?))
}

/// Create a habit, subject to the caller's plan quota.
#[utoipa::path(
    post,
    path = "/api/habits",
    tag = "Habits",
    request_body = CreateHabitRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Habit created", body = Habit),
        (status = 400, description = "Malformed body or empty name"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Habit quota for the plan reached"),
        (status = 500, description = "Persistence failure")
    )
)]
pub async fn post_habit(
    Auth(user): Auth,
    State(state): State<AppState>,
    payload: Result<Json<CreateHabitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Habit>), ApiError> {
    let Json(request) = payload?;
    let habit = create_habit(&state.store, &user.user_id, &request.name, Utc::now())?;
    Ok((StatusCode::CREATED, Json(habit)))
}

/// Record today's progress on a habit.
#[utoipa::path(
    put,
    path = "/api/habits/{habit_id}/progress",
    tag = "Habits",
    params(
        ("habit_id" = String, Path, description = "Habit ID")
    ),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated habit", body = Habit),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Habit not found"),
        (status = 409, description = "Already tracked today"),
        (status = 500, description = "Persistence failure")
    )
)]
pub async fn put_habit_progress(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
) -> Result<Json<Habit>, ApiError> {
    let habit = advance_progress(&state.store, &habit_id, &user.user_id, Utc::now())?;
    Ok(Json(habit))
}
