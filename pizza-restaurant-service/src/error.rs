use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, warn};

use crate::serializer::{ApiErrorResponse, ValidationErrorResponse};
use crate::store::StoreError;

pub const RESTAURANT_NOT_FOUND: &str = "Restaurant not found";
pub const VALIDATION_ERRORS: &str = "validation errors";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Errors surfaced over HTTP.
///
/// Clients only ever see the generic bodies below; the typed cause is kept for
/// logging and tests.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Restaurant not found")]
    RestaurantNotFound,
    #[error("Invalid restaurant id: {0}")]
    InvalidRestaurantId(#[from] PathRejection),
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
    #[error("Restaurant pizza rejected: {0}")]
    RestaurantPizzaRejected(#[source] StoreError),
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::RestaurantNotFound | ApiError::InvalidRestaurantId(_) => (
                StatusCode::NOT_FOUND,
                Json(ApiErrorResponse {
                    error: RESTAURANT_NOT_FOUND.to_string(),
                }),
            )
                .into_response(),
            ApiError::InvalidBody(_) | ApiError::RestaurantPizzaRejected(_) => {
                warn!(error = %self, "validation failed");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ValidationErrorResponse {
                        errors: vec![VALIDATION_ERRORS.to_string()],
                    }),
                )
                    .into_response()
            }
            ApiError::Store(_) => {
                error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiErrorResponse {
                        error: INTERNAL_ERROR.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
