//! Session persistence. One row per user: logging in replaces whatever
//! session the user had before, which is what invalidates older tokens.

use sqlx::PgPool;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::SessionWithUser;

/// Replace the user's active session: delete any existing rows, then insert
/// the new one. Done in a transaction so a crash cannot leave the user with
/// zero or two sessions.
pub async fn replace_for_user(
    pool: &PgPool,
    user_id: i32,
    refresh_token: &str,
    session_id: Uuid,
) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO user_sessions (user_id, refresh_token, session_id, created_at) \
         VALUES ($1, $2, $3, NOW())",
    )
    .bind(user_id)
    .bind(refresh_token)
    .bind(session_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Look up the session the access guard expects: the row matching both the
/// user id and session id from the token claims, joined with the user.
pub async fn find_active(
    pool: &PgPool,
    user_id: i32,
    session_id: Uuid,
) -> Result<Option<SessionWithUser>, DatabaseError> {
    let session = sqlx::query_as::<_, SessionWithUser>(
        "SELECT s.user_id, s.session_id, s.refresh_token, s.created_at, \
                u.nombre_usuario, u.nombre_completo, u.activo \
         FROM user_sessions s \
         JOIN usuarios_app u ON s.user_id = u.usuario_id \
         WHERE s.session_id = $1 AND s.user_id = $2",
    )
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// Look up a session by its refresh token, optionally narrowed to a session
/// id when the client supplies one.
pub async fn find_by_refresh_token(
    pool: &PgPool,
    refresh_token: &str,
    session_id: Option<Uuid>,
) -> Result<Option<SessionWithUser>, DatabaseError> {
    let session = sqlx::query_as::<_, SessionWithUser>(
        "SELECT s.user_id, s.session_id, s.refresh_token, s.created_at, \
                u.nombre_usuario, u.nombre_completo, u.activo \
         FROM user_sessions s \
         JOIN usuarios_app u ON s.user_id = u.usuario_id \
         WHERE s.refresh_token = $1 \
           AND ($2::uuid IS NULL OR s.session_id = $2)",
    )
    .bind(refresh_token)
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

pub async fn delete_by_session_id(pool: &PgPool, session_id: Uuid) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM user_sessions WHERE session_id = $1")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_by_refresh_token(
    pool: &PgPool,
    refresh_token: &str,
) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM user_sessions WHERE refresh_token = $1")
        .bind(refresh_token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
