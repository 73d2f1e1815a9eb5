use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::services::ServiceError;
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::with_message(data, "Success")
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            code: 200,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

pub fn status_for(code: i32) -> StatusCode {
    u16::try_from(code)
        .ok()
        .and_then(|c| StatusCode::from_u16(c).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// A `ServiceError` rendered as the standard envelope with a matching status.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ServiceError {
            code,
            message,
            data,
        } = self.0;
        let status = status_for(code);
        if status.is_server_error() {
            tracing::error!("request failed: {}", message);
        }

        let body = ApiResponse {
            code,
            message,
            data,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        (status, Json(body)).into_response()
    }
}
