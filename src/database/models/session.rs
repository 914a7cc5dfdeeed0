use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted session row joined with the owning user, as needed by the
/// access guard and the refresh endpoint.
#[derive(Debug, Clone, FromRow)]
pub struct SessionWithUser {
    pub user_id: i32,
    pub session_id: Uuid,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub nombre_usuario: String,
    pub nombre_completo: String,
    pub activo: bool,
}
