//! Hero power endpoints.
//!
//! A hero power is immutable once created; it can only be listed, fetched or
//! deleted. Foreign keys are left to the database: a dangling `hero_id` or
//! `power_id` fails the insert and is reported as a constraint violation.

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use tracing::{error, instrument};

use super::{
    error::{ApiError, Entity},
    storage::{
        delete_hero_power as delete_hero_power_record, fetch_hero_power, fetch_hero_powers,
        insert_hero_power,
    },
    types::{CreateHeroPowerRequest, ErrorResponse, HeroPowerResponse, ValidationErrorResponse},
    validation::{ValidationError, validate_new_hero_power},
};

#[utoipa::path(
    get,
    path = "/hero_powers",
    responses(
        (status = 200, description = "List hero powers with their hero and power.", body = [HeroPowerResponse]),
    ),
    tag = "hero_powers"
)]
pub async fn list_hero_powers(pool: Extension<SqlitePool>) -> impl IntoResponse {
    match fetch_hero_powers(&pool).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => {
            error!("Failed to list hero powers: {err}");
            ApiError::from(err).into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/hero_powers",
    request_body = CreateHeroPowerRequest,
    responses(
        (status = 201, description = "Hero power created.", body = HeroPowerResponse),
        (status = 400, description = "Missing field or strength not one of Strong, Weak, Average.", body = ValidationErrorResponse),
        (status = 500, description = "Hero or power does not exist.", body = ErrorResponse),
    ),
    tag = "hero_powers"
)]
/// Links a hero to a power with a strength of `Strong`, `Weak` or `Average`.
#[instrument(skip(pool, payload))]
pub async fn create_hero_power(
    pool: Extension<SqlitePool>,
    payload: Option<Json<CreateHeroPowerRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return ApiError::from(ValidationError::Payload).into_response();
    };

    let hero_power = match validate_new_hero_power(&payload) {
        Ok(hero_power) => hero_power,
        Err(errors) => return ApiError::from(errors).into_response(),
    };

    match insert_hero_power(&pool, &hero_power).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/hero_powers/{id}",
    params(("id" = i64, Path, description = "Hero power id")),
    responses(
        (status = 200, description = "Hero power with its hero and power.", body = HeroPowerResponse),
        (status = 404, description = "Hero power not found.", body = ErrorResponse),
    ),
    tag = "hero_powers"
)]
pub async fn get_hero_power(Path(id): Path<i64>, pool: Extension<SqlitePool>) -> impl IntoResponse {
    match fetch_hero_power(&pool, id).await {
        Ok(Some(hero_power)) => (StatusCode::OK, Json(hero_power)).into_response(),
        Ok(None) => ApiError::NotFound(Entity::HeroPower).into_response(),
        Err(err) => {
            error!("Failed to get hero power: {err}");
            ApiError::from(err).into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/hero_powers/{id}",
    params(("id" = i64, Path, description = "Hero power id")),
    responses(
        (status = 204, description = "Hero power deleted."),
        (status = 404, description = "Hero power not found.", body = ErrorResponse),
    ),
    tag = "hero_powers"
)]
#[instrument(skip(pool))]
pub async fn delete_hero_power(
    Path(id): Path<i64>,
    pool: Extension<SqlitePool>,
) -> impl IntoResponse {
    match delete_hero_power_record(&pool, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
