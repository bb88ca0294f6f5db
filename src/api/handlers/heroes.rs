//! Hero endpoints.
//!
//! Handlers parse and validate input, then delegate to `storage`. The list
//! endpoint returns summaries only; detail responses nest each association
//! with its power.

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
        delete_hero as delete_hero_record, fetch_hero_detail, fetch_heroes, hero_exists,
        insert_hero, update_hero,
    },
    types::{
        CreateHeroRequest, ErrorResponse, HeroDetail, HeroSummary, UpdateHeroRequest,
        ValidationErrorResponse,
    },
    validation::{ValidationError, validate_hero_changes, validate_new_hero},
};

#[utoipa::path(
    get,
    path = "/heroes",
    responses(
        (status = 200, description = "List heroes.", body = [HeroSummary]),
    ),
    tag = "heroes"
)]
/// Lists every hero as `{id, name, super_name}` without nested powers.
pub async fn list_heroes(pool: Extension<SqlitePool>) -> impl IntoResponse {
    match fetch_heroes(&pool).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => {
            error!("Failed to list heroes: {err}");
            ApiError::from(err).into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/heroes",
    request_body = CreateHeroRequest,
    responses(
        (status = 201, description = "Hero created.", body = HeroDetail),
        (status = 400, description = "Invalid input.", body = ValidationErrorResponse),
    ),
    tag = "heroes"
)]
/// Creates a hero; both `name` and `super_name` are required and must not be blank.
#[instrument(skip(pool, payload))]
pub async fn create_hero(
    pool: Extension<SqlitePool>,
    payload: Option<Json<CreateHeroRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return ApiError::from(ValidationError::Payload).into_response();
    };

    let hero = match validate_new_hero(&payload) {
        Ok(hero) => hero,
        Err(errors) => return ApiError::from(errors).into_response(),
    };

    match insert_hero(&pool, &hero).await {
        Ok(detail) => (StatusCode::CREATED, Json(detail)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/heroes/{id}",
    params(("id" = i64, Path, description = "Hero id")),
    responses(
        (status = 200, description = "Hero detail.", body = HeroDetail),
        (status = 404, description = "Hero not found.", body = ErrorResponse),
    ),
    tag = "heroes"
)]
/// Fetches a hero with its hero powers, each nesting the linked power.
pub async fn get_hero(Path(id): Path<i64>, pool: Extension<SqlitePool>) -> impl IntoResponse {
    match fetch_hero_detail(&pool, id).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(detail)).into_response(),
        Ok(None) => ApiError::NotFound(Entity::Hero).into_response(),
        Err(err) => {
            error!("Failed to get hero: {err}");
            ApiError::from(err).into_response()
        }
    }
}

async fn apply_hero_update(
    id: i64,
    pool: &SqlitePool,
    payload: Option<Json<UpdateHeroRequest>>,
) -> Result<HeroDetail, ApiError> {
    let changes = match payload {
        Some(Json(payload)) => validate_hero_changes(&payload),
        None => Err(vec![ValidationError::Payload]),
    };

    match changes {
        Ok(changes) => update_hero(pool, id, &changes).await,
        // A missing record wins over a bad body.
        Err(errors) => {
            if hero_exists(pool, id).await? {
                Err(errors.into())
            } else {
                Err(ApiError::NotFound(Entity::Hero))
            }
        }
    }
}

#[utoipa::path(
    put,
    path = "/heroes/{id}",
    request_body = UpdateHeroRequest,
    params(("id" = i64, Path, description = "Hero id")),
    responses(
        (status = 200, description = "Hero updated.", body = HeroDetail),
        (status = 400, description = "Invalid input.", body = ValidationErrorResponse),
        (status = 404, description = "Hero not found.", body = ErrorResponse),
    ),
    tag = "heroes"
)]
/// Updates `name` and/or `super_name`; omitted fields keep their stored value.
#[instrument(skip(pool, payload))]
pub async fn put_hero(
    Path(id): Path<i64>,
    pool: Extension<SqlitePool>,
    payload: Option<Json<UpdateHeroRequest>>,
) -> impl IntoResponse {
    match apply_hero_update(id, &pool, payload).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/heroes/{id}",
    request_body = UpdateHeroRequest,
    params(("id" = i64, Path, description = "Hero id")),
    responses(
        (status = 200, description = "Hero updated.", body = HeroDetail),
        (status = 400, description = "Invalid input.", body = ValidationErrorResponse),
        (status = 404, description = "Hero not found.", body = ErrorResponse),
    ),
    tag = "heroes"
)]
/// Same as `PUT /heroes/{id}`.
#[instrument(skip(pool, payload))]
pub async fn patch_hero(
    Path(id): Path<i64>,
    pool: Extension<SqlitePool>,
    payload: Option<Json<UpdateHeroRequest>>,
) -> impl IntoResponse {
    match apply_hero_update(id, &pool, payload).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/heroes/{id}",
    params(("id" = i64, Path, description = "Hero id")),
    responses(
        (status = 204, description = "Hero and its hero powers deleted."),
        (status = 404, description = "Hero not found.", body = ErrorResponse),
    ),
    tag = "heroes"
)]
/// Deletes a hero and every hero power that references it.
#[instrument(skip(pool))]
pub async fn delete_hero(Path(id): Path<i64>, pool: Extension<SqlitePool>) -> impl IntoResponse {
    match delete_hero_record(&pool, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
