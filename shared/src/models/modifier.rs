//! Modifier Model (add-ons / preparation notes)

use serde::{Deserialize, Serialize};

/// Modifier entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Modifier {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Whether `price` is charged when the modifier is selected
    pub has_price: bool,
    pub price: Option<f64>,
    pub clave: Option<String>,
    pub created_at: i64,
}

/// Create modifier payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierCreate {
    pub name: String,
    pub description: String,
    pub has_price: bool,
    pub price: Option<f64>,
    pub clave: Option<String>,
    /// Categories whose meals this modifier may apply to
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

/// Price lookup row (batched price resolution)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ModifierPrice {
    pub id: i64,
    pub price: Option<f64>,
    pub has_price: bool,
}
