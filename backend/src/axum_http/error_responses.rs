use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Usecase errors that know which HTTP status they map to.
pub trait HttpError: std::fmt::Display {
    fn status_code(&self) -> StatusCode;
}

/// Uniform `{error, code}` JSON failure body.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl<E> From<E> for AppError
where
    E: HttpError,
{
    fn from(err: E) -> Self {
        Self::new(err.status_code(), err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() && self.status != StatusCode::BAD_GATEWAY {
            // Detail is logged by the usecase, never returned.
            "Internal server error".to_string()
        } else {
            self.message
        };

        let body = Json(ErrorResponse {
            error: message,
            code: self.status.as_u16(),
        });

        (self.status, body).into_response()
    }
}
