use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tourly_booking::BookingError;
use tourly_catalog::CatalogError;
use tourly_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    AuthorizationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::Timeout => (StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string()),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded".to_string()),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::TourNotFound(_) | BookingError::BookingNotFound(_) => {
                AppError::NotFoundError(err.to_string())
            }
            BookingError::InvalidDate
            | BookingError::InsufficientInventory { .. }
            | BookingError::GuestCountMismatch { .. }
            | BookingError::InvalidGuestData(_)
            | BookingError::InvalidStatus(_) => AppError::ValidationError(err.to_string()),
            BookingError::InvalidTransition { .. } => AppError::ConflictError(err.to_string()),
            BookingError::Store(e) => AppError::Anyhow(e.into()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => AppError::NotFoundError("Tour not found".to_string()),
            CatalogError::InvalidTour(msg) => AppError::ValidationError(msg),
            CatalogError::TourInUse(_) | CatalogError::Conflict(_) => AppError::ConflictError(err.to_string()),
            CatalogError::Store(e) => AppError::Anyhow(e.into()),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => AppError::ValidationError(msg),
            CoreError::ConflictError(msg) => AppError::ConflictError(msg),
            CoreError::NotFound(msg) => AppError::NotFoundError(msg),
            CoreError::IdentityError(msg) => AppError::AuthenticationError(msg),
            CoreError::InternalError(msg) => AppError::Anyhow(anyhow::anyhow!(msg)),
            CoreError::Store(e) => AppError::Anyhow(e.into()),
        }
    }
}
