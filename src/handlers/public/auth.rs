//! Public authentication endpoints: login, refresh, logout.
//!
//! Login is the only place tokens are minted from credentials. It enforces
//! the single-session invariant by replacing the user's session row, so a
//! second login kills the first device's tokens.

use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{self, password};
use crate::database::models::ModuleAccess;
use crate::database::{manager::DatabaseManager, sessions, users};
use crate::error::ApiError;
use crate::middleware::{ApiMessage, ApiResponse};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: i32,
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub nombre: String,
    pub email: String,
    pub telefono: Option<String>,
    pub puesto: Option<String>,
    pub activo: bool,
    pub accesos: Vec<ModuleAccess>,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: LoginUser,
    pub tokens: TokenPair,
}

/// POST /api/login - authenticate and receive an access/refresh token pair
pub async fn login(
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::bad_request("Username requerido"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::bad_request("Contraseña requerida"));
    }

    tracing::info!(username = %payload.username, "login attempt");

    let pool = DatabaseManager::pool().await?;

    let user = users::find_by_username(&pool, &payload.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Credenciales inválidas"))?;

    if !user.activo {
        return Err(ApiError::forbidden("Usuario inactivo. Contacte al administrador"));
    }

    let password_matches = password::verify_password(&payload.password, &user.contrasena).await?;
    if !password_matches {
        return Err(ApiError::unauthorized("Credenciales inválidas"));
    }

    // Fresh session id per login; it travels inside both tokens
    let session_id = Uuid::new_v4();
    let access = auth::sign_access_token(user.usuario_id, &user.nombre_usuario, session_id)?;
    let refresh = auth::sign_refresh_token(user.usuario_id, &user.nombre_usuario, session_id)?;

    let accesos = users::menu_for_user(&pool, user.usuario_id).await?;

    // Single active session per user: older sessions die here
    sessions::replace_for_user(&pool, user.usuario_id, &refresh, session_id).await?;
    users::touch_last_access(&pool, user.usuario_id).await?;

    tracing::info!(username = %user.nombre_usuario, "login ok");

    Ok(ApiResponse::success(LoginResponse {
        user: LoginUser {
            id: user.usuario_id,
            username: user.nombre_usuario,
            full_name: user.nombre_completo.clone(),
            nombre: user.nombre_completo,
            email: user.email,
            telefono: user.telefono,
            puesto: user.puesto,
            activo: user.activo,
            accesos,
        },
        tokens: TokenPair { access, refresh, session_id },
    }))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<Uuid>,
}

/// POST /api/refresh - exchange a persisted refresh token for a new access
/// token. The refresh token itself is not rotated.
pub async fn refresh(
    Json(payload): Json<RefreshRequest>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let refresh_token = payload
        .refresh
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Refresh token requerido"))?;

    let pool = DatabaseManager::pool().await?;

    // The DB row is the source of truth; a signed token that is no longer
    // persisted has been revoked.
    let session = sessions::find_by_refresh_token(&pool, &refresh_token, payload.session_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Refresh token inválido o expirado"))?;

    if !session.activo {
        return Err(ApiError::forbidden("Usuario inactivo"));
    }

    let claims = auth::verify_refresh_token(&refresh_token)
        .map_err(|_| ApiError::unauthorized("Refresh token inválido o expirado"))?;

    let access =
        auth::sign_access_token(claims.user_id()?, &session.nombre_usuario, session.session_id)?;

    Ok(ApiResponse::success(json!({ "access": access })))
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<Uuid>,
}

/// POST /api/logout - drop the persisted session, revoking its tokens
pub async fn logout(Json(payload): Json<LogoutRequest>) -> Result<ApiMessage, ApiError> {
    let refresh = payload.refresh.as_deref().filter(|t| !t.is_empty());
    if payload.session_id.is_none() && refresh.is_none() {
        return Err(ApiError::bad_request("Refresh token o sessionId requerido"));
    }

    let pool = DatabaseManager::pool().await?;

    if let Some(session_id) = payload.session_id {
        sessions::delete_by_session_id(&pool, session_id).await?;
    } else if let Some(refresh) = refresh {
        sessions::delete_by_refresh_token(&pool, refresh).await?;
    }

    Ok(ApiMessage::new("Sesión cerrada correctamente"))
}
