//! Domain models
//!
//! Rows mirror the SQLite schema one-to-one (ids are `i64`, timestamps are
//! Unix millis, money is `f64` at rest). `FromRow`/`Type` derives are only
//! compiled with the `db` feature.

pub mod category;
pub mod log;
pub mod meal;
pub mod modifier;
pub mod order;
pub mod user;

pub use category::{Category, CategoryCreate};
pub use log::{ActionType, Log, LogWithUser};
pub use meal::{Meal, MealCreate, MealPrice};
pub use modifier::{Modifier, ModifierCreate, ModifierPrice};
pub use order::{
    MealSubtotal, Order, OrderCreate, OrderDetail, OrderItem, OrderItemDetail, OrderItemInput,
    OrderItemView, OrderStatus, OrderUpdate, Payment, PaymentInput, PaymentMethod,
    PlaceOrderResult, SelectedModifier,
};
pub use user::{User, UserCreate, UserRole};
