//! Order engine errors
//!
//! `OrderError` carries internal detail for logs; the `From<OrderError> for
//! AppError` impl below is the only place it is turned into a caller-facing
//! code + message.

use crate::db::repository::RepoError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Write step that failed inside the persisting transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStage {
    Order,
    Items,
    ItemDetails,
    Payments,
    Update,
    Delete,
}

impl PersistStage {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            PersistStage::Order => ErrorCode::OrderInsertFailed,
            PersistStage::Items => ErrorCode::OrderItemInsertFailed,
            PersistStage::ItemDetails => ErrorCode::OrderItemDetailsInsertFailed,
            PersistStage::Payments => ErrorCode::PaymentsInsertFailed,
            PersistStage::Update => ErrorCode::OrderUpdateFailed,
            PersistStage::Delete => ErrorCode::OrderDeleteFailed,
        }
    }
}

impl std::fmt::Display for PersistStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PersistStage::Order => "order",
            PersistStage::Items => "order items",
            PersistStage::ItemDetails => "order item details",
            PersistStage::Payments => "payments",
            PersistStage::Update => "order update",
            PersistStage::Delete => "order delete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Meal {0} not found")]
    MealNotFound(i64),

    #[error("Modifier {0} not found")]
    ModifierNotFound(i64),

    #[error("Order {0} not found")]
    OrderNotFound(i64),

    /// 菜单里存的价格本身不合法 (数据问题, 不是请求问题)
    #[error("Meal {id} has invalid stored price: {reason}")]
    InvalidMealPrice { id: i64, reason: String },

    #[error("Modifier {id} has invalid stored price: {reason}")]
    InvalidModifierPrice { id: i64, reason: String },

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Invalid order: {0}")]
    Validation(String),

    #[error("Insufficient payment: tendered {tendered:.2}, due {due:.2}")]
    InsufficientPayment { tendered: f64, due: f64 },

    #[error("Failed to persist {stage}: {message}")]
    Persist { stage: PersistStage, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Order task failed: {0}")]
    Task(String),
}

impl OrderError {
    /// Wrap a repository failure for the given write step
    pub fn persist(stage: PersistStage) -> impl FnOnce(RepoError) -> OrderError {
        move |e| OrderError::Persist {
            stage,
            message: e.to_string(),
        }
    }
}

impl From<RepoError> for OrderError {
    fn from(err: RepoError) -> Self {
        OrderError::Storage(err.to_string())
    }
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::Storage(err.to_string())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::MealNotFound(id) => {
                AppError::with_message(ErrorCode::MealNotFound, format!("Meal {id} not found"))
                    .with_detail("meal_id", id)
            }
            OrderError::ModifierNotFound(id) => AppError::with_message(
                ErrorCode::ModifierNotFound,
                format!("Modifier {id} not found"),
            )
            .with_detail("modifier_id", id),
            OrderError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
                    .with_detail("order_id", id)
            }
            OrderError::InvalidMealPrice { id, reason } => {
                tracing::error!(meal_id = id, reason = %reason, "Stored meal price is invalid");
                AppError::with_message(
                    ErrorCode::MealInvalidPrice,
                    format!("Meal {id} has an invalid price"),
                )
                .with_detail("meal_id", id)
            }
            OrderError::InvalidModifierPrice { id, reason } => {
                tracing::error!(modifier_id = id, reason = %reason, "Stored modifier price is invalid");
                AppError::with_message(
                    ErrorCode::MealInvalidPrice,
                    format!("Modifier {id} has an invalid price"),
                )
                .with_detail("modifier_id", id)
            }
            OrderError::UserNotFound(email) => {
                AppError::with_message(ErrorCode::UserNotFound, "Acting user not found")
                    .with_detail("email", email)
            }
            OrderError::EmptyOrder => AppError::new(ErrorCode::OrderEmpty),
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::InsufficientPayment { tendered, due } => {
                AppError::new(ErrorCode::PaymentInsufficientAmount)
                    .with_detail("tendered", tendered)
                    .with_detail("due", due)
            }
            OrderError::Persist { stage, message } => {
                tracing::error!(stage = %stage, error = %message, "Order persistence failed, transaction rolled back");
                AppError::new(stage.error_code())
            }
            OrderError::Storage(message) => {
                tracing::error!(error = %message, "Order storage error");
                AppError::new(ErrorCode::DatabaseError)
            }
            OrderError::Task(message) => {
                tracing::error!(error = %message, "Order task aborted");
                AppError::unknown()
            }
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
