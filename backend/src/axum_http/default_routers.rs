use axum::{http::StatusCode, response::IntoResponse};

use super::error_responses::AppError;

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}

pub async fn not_found() -> impl IntoResponse {
    AppError::new(StatusCode::NOT_FOUND, "Not found").into_response()
}
