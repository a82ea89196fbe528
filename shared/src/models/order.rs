//! Order Model

use serde::{Deserialize, Serialize};

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

/// Order row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// Sequence number within the business day (1-based)
    pub order_number: i64,
    pub status: OrderStatus,
    pub client_name: String,
    pub client_phone: String,
    pub total_price: f64,
    /// Order taker; `None` when the acting user could not be resolved
    pub user_id: Option<i64>,
    pub created_at: i64,
    pub delivered_at: Option<i64>,
    pub updated_at: i64,
}

/// Order line row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub meal_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    /// meal price × quantity (priced modifiers excluded)
    pub subtotal: f64,
}

/// Link between an order line and a selected modifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItemDetail {
    pub id: i64,
    pub order_item_id: i64,
    pub modifier_id: i64,
}

/// Tender row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub payment_method: PaymentMethod,
    pub amount_given: f64,
    pub created_at: i64,
}

// ============================================================================
// Requests
// ============================================================================

/// Requested order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub meal_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub modifiers: Vec<i64>,
}

/// Requested tender
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaymentInput {
    pub payment_method: PaymentMethod,
    pub amount_given: f64,
}

/// Place order request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub client_name: String,
    pub client_phone: String,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub payments: Vec<PaymentInput>,
}

/// Update order request; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub status: Option<OrderStatus>,
    /// Replaces every line of the order when present
    pub items: Option<Vec<OrderItemInput>>,
    /// Replaces every tender of the order when present
    pub payments: Option<Vec<PaymentInput>>,
}

// ============================================================================
// Responses
// ============================================================================

/// Per-line receipt entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealSubtotal {
    pub meal_id: i64,
    pub subtotal: f64,
}

/// Result of a successful order placement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResult {
    pub message: String,
    pub order_id: i64,
    pub order_number: i64,
    /// Tendered sum minus total; negative only under the advisory policy
    pub exchange: f64,
    pub total_price: f64,
    pub subtotals: Vec<MealSubtotal>,
}

/// Modifier chosen on an order line (read view)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SelectedModifier {
    pub order_item_id: i64,
    pub modifier_id: i64,
    pub name: String,
    pub has_price: bool,
    pub price: Option<f64>,
    pub clave: Option<String>,
}

/// Order line with its meal and modifiers resolved (read view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemView {
    pub id: i64,
    pub meal_id: i64,
    pub meal_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
    pub modifiers: Vec<SelectedModifier>,
    /// Kitchen ticket text: meal clave then modifier claves
    pub clave_line: Option<String>,
}

/// Full order aggregate (read view, cached)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemView>,
    pub payments: Vec<Payment>,
}
