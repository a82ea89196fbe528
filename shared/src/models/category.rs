//! Category Model

use serde::{Deserialize, Serialize};

/// Menu category (e.g. "Tacos", "Bebidas")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub category_name: String,
    /// Which menu the category belongs to (breakfast, lunch, ...)
    pub menu_type: String,
    pub created_at: i64,
}

/// Create category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub category_name: String,
    pub menu_type: String,
}
