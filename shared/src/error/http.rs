//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::MealNotFound
            | Self::ModifierNotFound
            | Self::UserNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists => StatusCode::CONFLICT,

            // 402 Payment Required
            Self::PaymentInsufficientAmount => StatusCode::PAYMENT_REQUIRED,

            // 500 Internal Server Error
            Self::Unknown
            | Self::MealInvalidPrice
            | Self::DatabaseError
            | Self::ConfigError
            | Self::OrderInsertFailed
            | Self::OrderItemInsertFailed
            | Self::OrderItemDetailsInsertFailed
            | Self::PaymentsInsertFailed
            | Self::OrderUpdateFailed
            | Self::OrderDeleteFailed
            | Self::OrderFetchFailed => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
