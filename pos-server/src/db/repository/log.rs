//! Log Repository (append-only)

use super::RepoResult;
use shared::models::{ActionType, LogWithUser};
use sqlx::SqlitePool;

const LOG_WITH_USER_SELECT: &str = "SELECT l.id, l.user_id, u.name AS user_name, u.email AS user_email, l.message, l.action_type, l.created_at FROM logs l JOIN users u ON u.id = l.user_id";

pub async fn insert(
    pool: &SqlitePool,
    user_id: i64,
    message: &str,
    action_type: ActionType,
    created_at: i64,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO logs (user_id, message, action_type, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING id",
    )
    .bind(user_id)
    .bind(message)
    .bind(action_type)
    .bind(created_at)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// All entries, newest first
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<LogWithUser>> {
    let logs = sqlx::query_as::<_, LogWithUser>(&format!(
        "{LOG_WITH_USER_SELECT} ORDER BY l.created_at DESC, l.id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(logs)
}

/// Entries written by one user, newest first
pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<LogWithUser>> {
    let logs = sqlx::query_as::<_, LogWithUser>(&format!(
        "{LOG_WITH_USER_SELECT} WHERE l.user_id = ? ORDER BY l.created_at DESC, l.id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(logs)
}
