use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full application user row, including the stored password hash.
/// Never serialized to clients as-is.
#[derive(Debug, Clone, FromRow)]
pub struct AppUser {
    pub usuario_id: i32,
    pub nombre_usuario: String,
    pub nombre_completo: String,
    pub email: String,
    pub contrasena: String,
    pub activo: bool,
    pub telefono: Option<String>,
    pub puesto: Option<String>,
}

/// Client-facing profile, used by /api/users/me
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub usuario_id: i32,
    pub nombre_usuario: String,
    pub nombre_completo: String,
    pub email: String,
    pub fecha_creacion: DateTime<Utc>,
}
