//! Meal Repository

use super::{MAX_BIND_IDS, RepoError, RepoResult, placeholders};
use shared::models::{Meal, MealCreate, MealPrice};
use sqlx::{SqliteConnection, SqlitePool};

const MEAL_COLUMNS: &str =
    "id, name, description, price, category_id, image_url, clave, is_clave_applied, created_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>(&format!("SELECT {MEAL_COLUMNS} FROM meals WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(meal)
}

pub async fn create(pool: &SqlitePool, data: MealCreate) -> RepoResult<Meal> {
    if !data.price.is_finite() || data.price < 0.0 {
        return Err(RepoError::Validation(format!(
            "Meal price must be a non-negative number, got {}",
            data.price
        )));
    }

    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO meals (name, description, price, category_id, image_url, clave, is_clave_applied, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING id",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.category_id)
    .bind(&data.image_url)
    .bind(&data.clave)
    .bind(data.is_clave_applied)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create meal".into()))
}

pub async fn update_price(pool: &SqlitePool, id: i64, price: f64) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE meals SET price = ? WHERE id = ?")
        .bind(price)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Meal {id} not found")));
    }
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM meals WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Batched price lookup; ids absent from the table are simply missing from the result
pub async fn find_prices_by_ids(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> RepoResult<Vec<MealPrice>> {
    let mut rows = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(MAX_BIND_IDS) {
        let sql = format!(
            "SELECT id, price FROM meals WHERE id IN ({})",
            placeholders(chunk.len())
        );
        let mut query = sqlx::query_as::<_, MealPrice>(&sql);
        for id in chunk {
            query = query.bind(id);
        }
        rows.extend(query.fetch_all(&mut *conn).await?);
    }
    Ok(rows)
}
