//! User and permission management.
//!
//! Read-side management (permissions, menus, module lists, user listings)
//! is a single stored-procedure passthrough with typed parameters; user
//! creation and updates need hashing and uniqueness checks, so they are
//! direct queries.
//!
//! sp_gestion_usuarios_permisos operations:
//!   1  permissions of a user           (p1 = user id)
//!   2  check a specific permission     (p1 = user, p2 = module, p3 = LEER/ESCRIBIR)
//!   3  assign/update a permission      (p1 = user, p2 = module, p3 = assigned by, p4/p5 = read/write)
//!   4  user menu                       (p1 = user id)
//!   5  active users
//!   6  all users
//!   7  user by id                      (p1 = user id)
//!   8  active modules
//!   9  set user active state           (p1 = user id, p4 = state)
//!   10 touch last access               (p1 = user id)
//!   11 remove one module permission    (p1 = user, p2 = module)
//!   12 remove all permissions          (p1 = user id)

use axum::extract::{Extension, Path, Query};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::password;
use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::procedures::OpParams;
use crate::database::rows::rows_to_json;
use crate::database::users;
use crate::error::ApiError;
use crate::middleware::{ApiMessage, ApiResponse, AuthUser};

fn parse_int_param(p: Option<&str>) -> Option<i32> {
    p.and_then(|s| s.parse().ok())
}

fn parse_bool_param(p: Option<&str>) -> Option<bool> {
    p.map(|s| s == "1" || s == "true")
}

/// GET /api/usuarios -> sp_gestion_usuarios_permisos
pub async fn manage_users(Query(params): Query<OpParams>) -> Result<Json<Value>, ApiError> {
    let op = params
        .op()
        .ok_or_else(|| ApiError::bad_request("Parámetro \"op\" requerido"))?;

    let pool = DatabaseManager::pool().await?;

    let rows = sqlx::query("SELECT * FROM sp_gestion_usuarios_permisos($1, $2, $3, $4, $5, $6)")
        .bind(op)
        .bind(parse_int_param(params.p1.as_deref()))
        .bind(parse_int_param(params.p2.as_deref()))
        .bind(params.p3.as_deref())
        .bind(parse_bool_param(params.p4.as_deref()))
        .bind(parse_bool_param(params.p5.as_deref()))
        .fetch_all(&pool)
        .await
        .map_err(DatabaseError::from)?;

    let rows = rows_to_json(&rows);

    // Mutating operations answer with a verdict row instead of data
    if let Some(resultado) = rows.first().and_then(|r| r.get("resultado")).and_then(Value::as_i64) {
        let mensaje = rows
            .first()
            .and_then(|r| r.get("mensaje"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        return Ok(Json(json!({
            "success": resultado == 1,
            "message": mensaje,
        })));
    }

    Ok(Json(json!({ "success": true, "data": rows })))
}

fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    parts.len() == 2
        && !parts[0].is_empty()
        && parts[1].contains('.')
        && !parts[1].starts_with('.')
        && !parts[1].ends_with('.')
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub nombre_usuario: String,
    pub nombre_completo: String,
    pub email: String,
    pub contrasena: String,
    pub telefono: Option<String>,
    pub puesto: Option<String>,
    pub activo: Option<bool>,
}

/// POST /api/usuarios/create
pub async fn create_user(Json(body): Json<CreateUserRequest>) -> Result<ApiMessage, ApiError> {
    if body.nombre_usuario.is_empty()
        || body.nombre_completo.is_empty()
        || body.email.is_empty()
        || body.contrasena.is_empty()
    {
        return Err(ApiError::bad_request(
            "Campos requeridos: nombreUsuario, nombreCompleto, email, contrasena",
        ));
    }
    if !is_valid_email(&body.email) {
        return Err(ApiError::bad_request("Formato de email inválido"));
    }
    if body.contrasena.len() < 6 {
        return Err(ApiError::bad_request("La contraseña debe tener al menos 6 caracteres"));
    }

    let pool = DatabaseManager::pool().await?;

    if users::username_exists(&pool, &body.nombre_usuario).await? {
        return Err(ApiError::bad_request("El nombre de usuario ya está en uso"));
    }
    if users::email_exists(&pool, &body.email, None).await? {
        return Err(ApiError::bad_request("El email ya está registrado"));
    }

    let hashed = password::hash_password(&body.contrasena, config::config().security.bcrypt_cost)
        .await?;

    let usuario_id = users::insert_user(
        &pool,
        users::NewUser {
            username: &body.nombre_usuario,
            full_name: &body.nombre_completo,
            email: &body.email,
            password_hash: &hashed,
            phone: body.telefono.as_deref(),
            position: body.puesto.as_deref(),
            active: body.activo.unwrap_or(true),
        },
    )
    .await?;

    tracing::info!(usuario_id, username = %body.nombre_usuario, "user created");

    Ok(ApiMessage::created(
        "Usuario creado correctamente",
        json!({ "usuarioId": usuario_id }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub nombre_completo: String,
    pub email: String,
    pub telefono: Option<String>,
    pub puesto: Option<String>,
    pub activo: Option<bool>,
}

/// PUT /api/usuarios/:usuario_id
pub async fn update_user(
    Path(usuario_id): Path<i32>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<ApiMessage, ApiError> {
    if body.nombre_completo.is_empty() || body.email.is_empty() {
        return Err(ApiError::bad_request("Campos requeridos: nombreCompleto, email"));
    }
    if !is_valid_email(&body.email) {
        return Err(ApiError::bad_request("Formato de email inválido"));
    }

    let pool = DatabaseManager::pool().await?;

    if !users::user_exists(&pool, usuario_id).await? {
        return Err(ApiError::not_found("Usuario no encontrado"));
    }
    if users::email_exists(&pool, &body.email, Some(usuario_id)).await? {
        return Err(ApiError::bad_request("El email ya está en uso por otro usuario"));
    }

    users::update_user(
        &pool,
        usuario_id,
        users::UserUpdate {
            full_name: &body.nombre_completo,
            email: &body.email,
            phone: body.telefono.as_deref(),
            position: body.puesto.as_deref(),
            active: body.activo.unwrap_or(false),
        },
    )
    .await?;

    Ok(ApiMessage::new("Usuario actualizado correctamente"))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub contrasena: String,
}

/// PUT /api/usuarios/:usuario_id/password
pub async fn change_password(
    Path(usuario_id): Path<i32>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<ApiMessage, ApiError> {
    if body.contrasena.is_empty() {
        return Err(ApiError::bad_request("UsuarioID y contraseña requeridos"));
    }
    if body.contrasena.len() < 6 {
        return Err(ApiError::bad_request("La contraseña debe tener al menos 6 caracteres"));
    }

    let pool = DatabaseManager::pool().await?;

    let hashed = password::hash_password(&body.contrasena, config::config().security.bcrypt_cost)
        .await?;

    let updated = users::update_password(&pool, usuario_id, &hashed).await?;
    if updated == 0 {
        return Err(ApiError::not_found("Usuario no encontrado"));
    }

    Ok(ApiMessage::new("Contraseña actualizada correctamente"))
}

/// GET /api/users/me - profile of the authenticated user
pub async fn me(
    Extension(auth_user): Extension<AuthUser>,
) -> Result<ApiResponse<crate::database::models::UserProfile>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let profile = users::find_profile(&pool, auth_user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Usuario no encontrado"))?;

    Ok(ApiResponse::success(profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_params_parse_or_drop() {
        assert_eq!(parse_int_param(Some("42")), Some(42));
        assert_eq!(parse_int_param(Some("nope")), None);
        assert_eq!(parse_int_param(None), None);
    }

    #[test]
    fn bool_params_accept_one_and_true() {
        assert_eq!(parse_bool_param(Some("1")), Some(true));
        assert_eq!(parse_bool_param(Some("true")), Some(true));
        assert_eq!(parse_bool_param(Some("0")), Some(false));
        assert_eq!(parse_bool_param(Some("false")), Some(false));
        assert_eq!(parse_bool_param(None), None);
    }

    #[test]
    fn email_validation_basics() {
        assert!(is_valid_email("ana@planta.hn"));
        assert!(is_valid_email("a.b@sub.dominio.com"));
        assert!(!is_valid_email("sin-arroba"));
        assert!(!is_valid_email("@dominio.com"));
        assert!(!is_valid_email("ana@sindominio"));
        assert!(!is_valid_email("ana@.com"));
    }
}
