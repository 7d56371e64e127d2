//! # Stub Error Type
//!
//! Every handler returns `Result<_, AppError>`. Errors render as
//! `{"error": {"code", "message", "details"?}}`, the envelope the portal
//! client reads its toast text from. Domain errors from `pyro-state` and
//! `pyro-schema` convert with `?`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pyro_schema::ValidationErrors;
use pyro_state::{GateError, ManageError, StatusError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. `NOT_FOUND`.
    pub code: String,
    pub message: String,
    /// Field-level errors for 422 responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    /// Semantically invalid request content (422).
    #[error("{0}")]
    Validation(String),

    /// Form validation failed; field errors go into `details`.
    #[error("{}", first_message(.0))]
    Fields(ValidationErrors),

    /// Body did not deserialize (422).
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Illegal status change or stale version token (409).
    #[error("{0}")]
    Conflict(String),

    /// Logged, never returned verbatim.
    #[error("internal error: {0}")]
    Internal(String),
}

fn first_message(errors: &ValidationErrors) -> String {
    errors
        .errors()
        .first()
        .map(|e| format!("{}: {}", e.path, e.message))
        .unwrap_or_else(|| "validation failed".to_string())
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) | Self::Fields(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            Self::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} not found"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };
        let details = match &self {
            Self::Fields(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        };
        tracing::debug!(status = status.as_u16(), code, %message, "request failed");

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<StatusError> for AppError {
    fn from(err: StatusError) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl From<ManageError> for AppError {
    fn from(err: ManageError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        Self::Forbidden(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        Self::Fields(err)
    }
}

impl From<pyro_core::ValidationError> for AppError {
    fn from(err: pyro_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Unwrap a JSON body, mapping deserialization failures to 422.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyro_state::{ApplicationStatus, Transition};

    #[test]
    fn status_errors_are_conflicts() {
        let err: AppError = StatusError::InvalidTransition {
            from: ApplicationStatus::Draft,
            transition: Transition::Approve,
        }
        .into();
        assert_eq!(err.status_and_code(), (StatusCode::CONFLICT, "CONFLICT"));
    }

    #[test]
    fn missing_county_is_forbidden() {
        let err: AppError = GateError::CountyRequired.into();
        assert_eq!(err.status_and_code().0, StatusCode::FORBIDDEN);
    }

    #[test]
    fn field_errors_lead_with_first_message() {
        let mut errors = ValidationErrors::new();
        errors.push("Partners", "At least one partner is required for partnerships");
        errors.push("Site.SiteBusinessName", "Required");
        let err = AppError::from(errors);
        assert_eq!(
            err.to_string(),
            "Partners: At least one partner is required for partnerships"
        );
        assert_eq!(err.status_and_code().0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn internal_message_is_hidden() {
        let resp = AppError::Internal("lock poisoned".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
