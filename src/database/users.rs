//! User lookups and the direct (non stored-procedure) user management
//! queries used by the /api/usuarios routes.

use sqlx::PgPool;

use super::manager::DatabaseError;
use super::models::{AppUser, ModuleAccess, UserProfile};

pub async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<AppUser>, DatabaseError> {
    let user = sqlx::query_as::<_, AppUser>(
        "SELECT usuario_id, nombre_usuario, nombre_completo, email, contrasena, \
                activo, telefono, puesto \
         FROM usuarios_app \
         WHERE nombre_usuario = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_profile(pool: &PgPool, user_id: i32) -> Result<Option<UserProfile>, DatabaseError> {
    let profile = sqlx::query_as::<_, UserProfile>(
        "SELECT usuario_id, nombre_usuario, nombre_completo, email, fecha_creacion \
         FROM usuarios_app \
         WHERE usuario_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

/// Build the user's menu: active modules the user can read, in display order.
pub async fn menu_for_user(pool: &PgPool, user_id: i32) -> Result<Vec<ModuleAccess>, DatabaseError> {
    let menu = sqlx::query_as::<_, ModuleAccess>(
        "SELECT m.modulo_id, m.nombre_modulo AS nombre, m.descripcion, m.ruta, \
                m.icono, m.orden, p.puede_leer, p.puede_escribir \
         FROM modulos m \
         JOIN permisos p ON m.modulo_id = p.modulo_id \
         WHERE m.activo AND p.usuario_id = $1 AND p.puede_leer \
         ORDER BY m.orden",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(menu)
}

/// Stamp the user's last-access time after a successful login
pub async fn touch_last_access(pool: &PgPool, user_id: i32) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE usuarios_app SET ultimo_acceso = NOW() WHERE usuario_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, DatabaseError> {
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM usuarios_app WHERE nombre_usuario = $1)")
            .bind(username)
            .fetch_one(pool)
            .await?;
    Ok(exists.0)
}

/// Check whether an email is taken, optionally ignoring one user id
/// (the user being updated keeps their own email).
pub async fn email_exists(
    pool: &PgPool,
    email: &str,
    excluding_user: Option<i32>,
) -> Result<bool, DatabaseError> {
    let exists: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM usuarios_app \
         WHERE email = $1 AND ($2::int IS NULL OR usuario_id <> $2))",
    )
    .bind(email)
    .bind(excluding_user)
    .fetch_one(pool)
    .await?;
    Ok(exists.0)
}

pub async fn user_exists(pool: &PgPool, user_id: i32) -> Result<bool, DatabaseError> {
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM usuarios_app WHERE usuario_id = $1)")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(exists.0)
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub full_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
    pub position: Option<&'a str>,
    pub active: bool,
}

/// Insert a user and return the generated id
pub async fn insert_user(pool: &PgPool, user: NewUser<'_>) -> Result<i32, DatabaseError> {
    let (usuario_id,): (i32,) = sqlx::query_as(
        "INSERT INTO usuarios_app \
            (nombre_usuario, nombre_completo, email, contrasena, telefono, puesto, activo, fecha_creacion) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) \
         RETURNING usuario_id",
    )
    .bind(user.username)
    .bind(user.full_name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.phone)
    .bind(user.position)
    .bind(user.active)
    .fetch_one(pool)
    .await?;

    Ok(usuario_id)
}

pub struct UserUpdate<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub position: Option<&'a str>,
    pub active: bool,
}

pub async fn update_user(
    pool: &PgPool,
    user_id: i32,
    update: UserUpdate<'_>,
) -> Result<u64, DatabaseError> {
    let result = sqlx::query(
        "UPDATE usuarios_app \
         SET nombre_completo = $2, email = $3, telefono = $4, puesto = $5, \
             activo = $6, fecha_modificacion = NOW() \
         WHERE usuario_id = $1",
    )
    .bind(user_id)
    .bind(update.full_name)
    .bind(update.email)
    .bind(update.phone)
    .bind(update.position)
    .bind(update.active)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn update_password(
    pool: &PgPool,
    user_id: i32,
    password_hash: &str,
) -> Result<u64, DatabaseError> {
    let result = sqlx::query(
        "UPDATE usuarios_app \
         SET contrasena = $2, fecha_modificacion = NOW() \
         WHERE usuario_id = $1",
    )
    .bind(user_id)
    .bind(password_hash)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
