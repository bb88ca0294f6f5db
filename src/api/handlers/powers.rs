//! Power endpoints.
//!
//! Updates are all-or-nothing: the merged description is validated inside the
//! update transaction before it commits, so a `400` never leaves a renamed
//! power behind. An unknown id is reported as `404` even when the body is bad.

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
        delete_power as delete_power_record, fetch_power_detail, fetch_powers, insert_power,
        power_exists, update_power,
    },
    types::{
        CreatePowerRequest, ErrorResponse, PowerDetail, PowerSummary, UpdatePowerRequest,
        ValidationErrorResponse,
    },
    validation::{ValidationError, validate_new_power, validate_power_changes},
};

#[utoipa::path(
    get,
    path = "/powers",
    responses(
        (status = 200, description = "List powers.", body = [PowerSummary]),
    ),
    tag = "powers"
)]
/// Lists every power as `{id, name, description}`.
pub async fn list_powers(pool: Extension<SqlitePool>) -> impl IntoResponse {
    match fetch_powers(&pool).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => {
            error!("Failed to list powers: {err}");
            ApiError::from(err).into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/powers",
    request_body = CreatePowerRequest,
    responses(
        (status = 201, description = "Power created.", body = PowerDetail),
        (status = 400, description = "Missing name or description shorter than 20 characters.", body = ValidationErrorResponse),
    ),
    tag = "powers"
)]
/// Creates a power. The description must be at least 20 characters long.
#[instrument(skip(pool, payload))]
pub async fn create_power(
    pool: Extension<SqlitePool>,
    payload: Option<Json<CreatePowerRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return ApiError::from(ValidationError::Payload).into_response();
    };

    let power = match validate_new_power(&payload) {
        Ok(power) => power,
        Err(errors) => return ApiError::from(errors).into_response(),
    };

    match insert_power(&pool, &power).await {
        Ok(detail) => (StatusCode::CREATED, Json(detail)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/powers/{id}",
    params(("id" = i64, Path, description = "Power id")),
    responses(
        (status = 200, description = "Power detail.", body = PowerDetail),
        (status = 404, description = "Power not found.", body = ErrorResponse),
    ),
    tag = "powers"
)]
/// Fetches a power with its hero powers, each nesting the linked hero.
pub async fn get_power(Path(id): Path<i64>, pool: Extension<SqlitePool>) -> impl IntoResponse {
    match fetch_power_detail(&pool, id).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(detail)).into_response(),
        Ok(None) => ApiError::NotFound(Entity::Power).into_response(),
        Err(err) => {
            error!("Failed to get power: {err}");
            ApiError::from(err).into_response()
        }
    }
}

async fn apply_power_update(
    id: i64,
    pool: &SqlitePool,
    payload: Option<Json<UpdatePowerRequest>>,
) -> Result<PowerDetail, ApiError> {
    let changes = match payload {
        Some(Json(payload)) => validate_power_changes(&payload),
        None => Err(vec![ValidationError::Payload]),
    };

    match changes {
        Ok(changes) => update_power(pool, id, &changes).await,
        // A missing record wins over a bad body.
        Err(errors) => {
            if power_exists(pool, id).await? {
                Err(errors.into())
            } else {
                Err(ApiError::NotFound(Entity::Power))
            }
        }
    }
}

#[utoipa::path(
    patch,
    path = "/powers/{id}",
    request_body = UpdatePowerRequest,
    params(("id" = i64, Path, description = "Power id")),
    responses(
        (status = 200, description = "Power updated.", body = PowerDetail),
        (status = 400, description = "Resulting description shorter than 20 characters.", body = ValidationErrorResponse),
        (status = 404, description = "Power not found.", body = ErrorResponse),
    ),
    tag = "powers"
)]
/// Partially updates a power. Nothing is written when validation fails.
#[instrument(skip(pool, payload))]
pub async fn patch_power(
    Path(id): Path<i64>,
    pool: Extension<SqlitePool>,
    payload: Option<Json<UpdatePowerRequest>>,
) -> impl IntoResponse {
    match apply_power_update(id, &pool, payload).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/powers/{id}",
    request_body = UpdatePowerRequest,
    params(("id" = i64, Path, description = "Power id")),
    responses(
        (status = 200, description = "Power updated.", body = PowerDetail),
        (status = 400, description = "Resulting description shorter than 20 characters.", body = ValidationErrorResponse),
        (status = 404, description = "Power not found.", body = ErrorResponse),
    ),
    tag = "powers"
)]
/// Same as `PATCH /powers/{id}`.
#[instrument(skip(pool, payload))]
pub async fn put_power(
    Path(id): Path<i64>,
    pool: Extension<SqlitePool>,
    payload: Option<Json<UpdatePowerRequest>>,
) -> impl IntoResponse {
    match apply_power_update(id, &pool, payload).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/powers/{id}",
    params(("id" = i64, Path, description = "Power id")),
    responses(
        (status = 204, description = "Power and its hero powers deleted."),
        (status = 404, description = "Power not found.", body = ErrorResponse),
    ),
    tag = "powers"
)]
#[instrument(skip(pool))]
pub async fn delete_power(Path(id): Path<i64>, pool: Extension<SqlitePool>) -> impl IntoResponse {
    match delete_power_record(&pool, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
