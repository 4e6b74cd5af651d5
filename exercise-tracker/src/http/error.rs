use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{debug, error};

use crate::dates::InvalidDate;
use crate::store::StoreError;

const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Request failures.
///
/// Domain outcomes (missing username, taken username, unknown user) are
/// answered with `200 OK` and an `error` field; clients read the body, not the
/// status. Everything else is logged and collapsed to a fixed 500 message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("username is required")]
    UsernameRequired,
    #[error("username already exists")]
    UsernameTaken,
    #[error("User does not exists")]
    UserNotFound,
    #[error("invalid request body: {0}")]
    BadRequest(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UsernameRequired | ApiError::UsernameTaken | ApiError::UserNotFound => {
                StatusCode::OK
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidInput(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status().is_server_error()
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateUsername => ApiError::UsernameTaken,
            other => ApiError::Store(other),
        }
    }
}

impl From<InvalidDate> for ApiError {
    fn from(error: InvalidDate) -> Self {
        ApiError::InvalidInput(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = if self.is_internal() {
            error!(error = %self, "request failed");
            String::from(INTERNAL_MESSAGE)
        } else {
            debug!(error = %self, "request rejected");
            self.to_string()
        };

        let body = Json(serde_json::json!({ "error": message }));
        (self.status(), body).into_response()
    }
}
