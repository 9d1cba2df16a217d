//! API error types and helpers.
//!
//! Every failing endpoint returns the same `{code, message}` body. Handlers
//! translate store and sync failures through the helpers here so status
//! codes stay consistent across the surface: unknown records are 404,
//! rejected batches and duplicate keys are 409, malformed input is 400, and
//! anything unexpected is logged server-side and returned as a generic 500.
use crate::api::types::ErrorResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use marquee_sync::SyncError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn api_not_found(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        body: ErrorResponse {
            code: "not_found".to_string(),
            message: message.to_string(),
        },
    }
}

pub fn api_conflict(code: &str, message: &str) -> ApiError {
    // Caller provides a specific conflict code for precise client handling.
    ApiError {
        status: StatusCode::CONFLICT,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
        },
    }
}

pub fn api_validation_error(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        body: ErrorResponse {
            code: "validation_error".to_string(),
            message: message.to_string(),
        },
    }
}

/// Logs the underlying error server-side and returns a generic message.
pub fn api_internal<E: std::fmt::Debug>(message: &str, err: &E) -> ApiError {
    tracing::error!(error = ?err, "storage error");
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            code: "internal".to_string(),
            message: message.to_string(),
        },
    }
}

impl From<marquee_store::StoreError> for ApiError {
    fn from(err: marquee_store::StoreError) -> Self {
        use marquee_store::StoreError;
        match err {
            StoreError::NotFound(what) => api_not_found(&what),
            StoreError::Conflict(what) => api_conflict("conflict", &what),
            StoreError::BatchConflict(what) => api_conflict("batch_conflict", &what),
            StoreError::Unexpected(inner) => api_internal("storage failed", &inner),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::NotFound(what) => api_not_found(&what),
            SyncError::BatchConflict(what) => api_conflict("batch_conflict", &what),
            SyncError::Unexpected(inner) => api_internal("storage failed", &inner),
        }
    }
}
