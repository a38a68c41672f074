//! HTTP-facing errors.
//!
//! Every failure the API reports is rendered as `{"message": "..."}` with the
//! matching status code.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::QueryRejection;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, warn};

/// JSON body shared by every error response.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

/// Errors returned by the upload and download handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The route exists but not for this method
    #[error("Method Not Allowed. (Only {0} is allowed)")]
    MethodNotAllowed(Method),

    /// Malformed or oversized request body
    #[error("{0}")]
    BadRequest(String),

    /// No live file under the requested key
    #[error("file not found.")]
    FileNotFound,

    /// No route matches the path
    #[error("Not Found")]
    RouteNotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::FileNotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::BadRequest(reason) => warn!(%reason, "Rejected malformed request"),
            other => debug!(status = status.as_u16(), error = %other, "Request refused"),
        }

        let payload = Json(MessageBody {
            message: self.to_string(),
        });
        (status, payload).into_response()
    }
}
