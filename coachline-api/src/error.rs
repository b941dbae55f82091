use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use coachline_core::BookingError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Seconds a client should wait before retrying a contended request.
const RETRY_AFTER_SECONDS: &str = "1";

impl AppError {
    fn is_retryable(&self) -> bool {
        matches!(self, AppError::Booking(err) if err.is_retryable())
    }

    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Booking(err) => {
                let status = match err {
                    BookingError::InvalidRequest(_) | BookingError::SeatOutOfRange { .. } => StatusCode::BAD_REQUEST,
                    BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
                    BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
                    BookingError::SeatAlreadyBooked(_) | BookingError::Conflict(_) => StatusCode::CONFLICT,
                    BookingError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.kind())
            }
            AppError::Anyhow(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal Server Error: {}", self);
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": kind,
            "message": message,
        }));

        if self.is_retryable() {
            return (status, [(header::RETRY_AFTER, RETRY_AFTER_SECONDS)], body).into_response();
        }
        (status, body).into_response()
    }
}
