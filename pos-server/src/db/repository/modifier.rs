//! Modifier Repository

use super::{MAX_BIND_IDS, RepoError, RepoResult, placeholders};
use shared::models::{Modifier, ModifierCreate, ModifierPrice};
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Modifier>> {
    let modifier = sqlx::query_as::<_, Modifier>(
        "SELECT id, name, description, has_price, price, clave, created_at FROM modifiers WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(modifier)
}

/// Create a modifier and link it to its categories
pub async fn create(pool: &SqlitePool, data: ModifierCreate) -> RepoResult<Modifier> {
    if let Some(price) = data.price
        && (!price.is_finite() || price < 0.0)
    {
        return Err(RepoError::Validation(format!(
            "Modifier price must be a non-negative number, got {price}"
        )));
    }
    if data.has_price && data.price.is_none() {
        return Err(RepoError::Validation(
            "A priced modifier needs a price".into(),
        ));
    }

    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO modifiers (name, description, has_price, price, clave, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.has_price)
    .bind(data.price)
    .bind(&data.clave)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for category_id in &data.category_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO modifier_categories (modifier_id, category_id) VALUES (?1, ?2)",
        )
        .bind(id)
        .bind(category_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create modifier".into()))
}

/// Category ids a modifier may apply to
pub async fn find_category_ids(pool: &SqlitePool, modifier_id: i64) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT category_id FROM modifier_categories WHERE modifier_id = ? ORDER BY category_id",
    )
    .bind(modifier_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Batched price lookup; ids absent from the table are simply missing from the result
pub async fn find_prices_by_ids(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> RepoResult<Vec<ModifierPrice>> {
    let mut rows = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(MAX_BIND_IDS) {
        let sql = format!(
            "SELECT id, price, has_price FROM modifiers WHERE id IN ({})",
            placeholders(chunk.len())
        );
        let mut query = sqlx::query_as::<_, ModifierPrice>(&sql);
        for id in chunk {
            query = query.bind(id);
        }
        rows.extend(query.fetch_all(&mut *conn).await?);
    }
    Ok(rows)
}
