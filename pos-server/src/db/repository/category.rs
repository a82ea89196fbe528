//! Category Repository

use super::{RepoError, RepoResult};
use shared::models::{Category, CategoryCreate};
use sqlx::SqlitePool;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, category_name, menu_type, created_at FROM categories WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

pub async fn create(pool: &SqlitePool, data: CategoryCreate) -> RepoResult<Category> {
    if data.category_name.trim().is_empty() {
        return Err(RepoError::Validation("Category name cannot be empty".into()));
    }

    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO categories (category_name, menu_type, created_at) VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(&data.category_name)
    .bind(&data.menu_type)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create category".into()))
}
