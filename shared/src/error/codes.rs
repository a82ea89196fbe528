//! Unified error codes for the point-of-sale backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Menu errors (meals, modifiers)
//! - 8xxx: User errors
//! - 9xxx: System errors
//!
//! Every code also carries a stable SCREAMING_SNAKE name ([`ErrorCode::name`])
//! which is what the front-of-house clients switch on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 on the wire for compact serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no line items
    OrderEmpty = 4007,
    /// Writing the order row failed
    OrderInsertFailed = 4101,
    /// Writing an order item failed
    OrderItemInsertFailed = 4102,
    /// Writing order item modifiers failed
    OrderItemDetailsInsertFailed = 4103,
    /// Writing payments failed
    PaymentsInsertFailed = 4104,
    /// Updating the order failed
    OrderUpdateFailed = 4105,
    /// Deleting the order failed
    OrderDeleteFailed = 4106,
    /// Reading orders failed
    OrderFetchFailed = 4107,

    // ==================== 5xxx: Payment ====================
    /// Insufficient payment amount
    PaymentInsufficientAmount = 5002,

    // ==================== 6xxx: Menu ====================
    /// Meal not found
    MealNotFound = 6001,
    /// Meal has invalid price
    MealInvalidPrice = 6002,
    /// Modifier not found
    ModifierNotFound = 6011,

    // ==================== 8xxx: User ====================
    /// User not found
    UserNotFound = 8001,

    // ==================== 9xxx: System ====================
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Stable machine-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            ErrorCode::Success => "SUCCESS",
            ErrorCode::Unknown => "UNKNOWN_ERROR",
            ErrorCode::ValidationFailed => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::OrderNotFound => "ORDER_NOT_FOUND",
            ErrorCode::OrderEmpty => "ORDER_EMPTY",
            ErrorCode::OrderInsertFailed => "ORDER_INSERT_ERROR",
            ErrorCode::OrderItemInsertFailed => "ORDER_ITEM_INSERT_ERROR",
            ErrorCode::OrderItemDetailsInsertFailed => "ORDER_ITEM_DETAILS_INSERT_ERROR",
            ErrorCode::PaymentsInsertFailed => "PAYMENTS_INSERT_ERROR",
            ErrorCode::OrderUpdateFailed => "FAILED_TO_UPDATE_ORDER",
            ErrorCode::OrderDeleteFailed => "DELETE_ERROR",
            ErrorCode::OrderFetchFailed => "FAILED_TO_FETCH_ORDERS",
            ErrorCode::PaymentInsufficientAmount => "INSUFFICIENT_PAYMENT_ERROR",
            ErrorCode::MealNotFound => "MEAL_NOT_FOUND",
            ErrorCode::MealInvalidPrice => "MEAL_INVALID_PRICE",
            ErrorCode::ModifierNotFound => "MODIFIER_NOT_FOUND",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
        }
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::OrderInsertFailed => "Failed to save order",
            ErrorCode::OrderItemInsertFailed => "Failed to save order items",
            ErrorCode::OrderItemDetailsInsertFailed => "Failed to save order item modifiers",
            ErrorCode::PaymentsInsertFailed => "Failed to save payments",
            ErrorCode::OrderUpdateFailed => "Failed to update order",
            ErrorCode::OrderDeleteFailed => "Failed to delete order",
            ErrorCode::OrderFetchFailed => "Failed to fetch orders",

            // Payment
            ErrorCode::PaymentInsufficientAmount => "Insufficient payment amount",

            // Menu
            ErrorCode::MealNotFound => "Meal not found",
            ErrorCode::MealInvalidPrice => "Meal has invalid price",
            ErrorCode::ModifierNotFound => "Modifier not found",

            // User
            ErrorCode::UserNotFound => "User not found",

            // System
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4007 => Ok(ErrorCode::OrderEmpty),
            4101 => Ok(ErrorCode::OrderInsertFailed),
            4102 => Ok(ErrorCode::OrderItemInsertFailed),
            4103 => Ok(ErrorCode::OrderItemDetailsInsertFailed),
            4104 => Ok(ErrorCode::PaymentsInsertFailed),
            4105 => Ok(ErrorCode::OrderUpdateFailed),
            4106 => Ok(ErrorCode::OrderDeleteFailed),
            4107 => Ok(ErrorCode::OrderFetchFailed),

            // Payment
            5002 => Ok(ErrorCode::PaymentInsufficientAmount),

            // Menu
            6001 => Ok(ErrorCode::MealNotFound),
            6002 => Ok(ErrorCode::MealInvalidPrice),
            6011 => Ok(ErrorCode::ModifierNotFound),

            // User
            8001 => Ok(ErrorCode::UserNotFound),

            // System
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}
