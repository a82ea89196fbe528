//! Meal Model

use serde::{Deserialize, Serialize};

/// Meal entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Meal {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Unit price in currency unit
    pub price: f64,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
    /// Kitchen ticket code
    pub clave: Option<String>,
    pub is_clave_applied: bool,
    pub created_at: i64,
}

/// Create meal payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealCreate {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
    pub clave: Option<String>,
    #[serde(default)]
    pub is_clave_applied: bool,
}

/// Price lookup row (batched price resolution)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MealPrice {
    pub id: i64,
    pub price: f64,
}
