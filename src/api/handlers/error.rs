//! Error taxonomy shared by every handler.
//!
//! Validation reasons are logged but never echoed back; clients always get the
//! fixed `{"errors": ["validation errors"]}` body. Database details stay in the
//! logs as well.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::error::ErrorKind;
use tracing::{debug, error, warn};

use super::{
    types::{ErrorResponse, ValidationErrorResponse},
    validation::ValidationError,
};

pub const VALIDATION_ERRORS: &str = "validation errors";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Hero,
    Power,
    HeroPower,
}

impl Entity {
    pub fn not_found_message(self) -> &'static str {
        match self {
            Self::Hero => "Hero not found",
            Self::Power => "Power not found",
            Self::HeroPower => "HeroPower not found",
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(Entity),
    Validation(Vec<ValidationError>),
    /// The store rejected a write on a foreign-key, check, unique or not-null constraint.
    Constraint(sqlx::Error),
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if is_constraint_violation(&err) {
            Self::Constraint(err)
        } else {
            Self::Database(err)
        }
    }
}

impl From<Vec<ValidationError>> for ApiError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(vec![error])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(entity) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: entity.not_found_message().to_string(),
                }),
            )
                .into_response(),
            Self::Validation(errors) => {
                for reason in &errors {
                    debug!("Validation failed: {reason}");
                }
                (
                    StatusCode::BAD_REQUEST,
                    Json(ValidationErrorResponse {
                        errors: vec![VALIDATION_ERRORS.to_string()],
                    }),
                )
                    .into_response()
            }
            Self::Constraint(err) => {
                warn!("Constraint violation: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Constraint violation".to_string(),
                    }),
                )
                    .into_response()
            }
            Self::Database(err) => {
                error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Internal server error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Returns `true` when `err` is a constraint failure raised by the database.
fn is_constraint_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(
            db_err.kind(),
            ErrorKind::ForeignKeyViolation
                | ErrorKind::CheckViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::UniqueViolation
        ),
        _ => false,
    }
}
