use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth;
use crate::database::{manager::DatabaseManager, sessions};
use crate::error::ApiError;

/// Authenticated user context, injected into the request once the bearer
/// token and its persisted session have both been validated.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub session_id: Uuid,
    pub full_name: String,
}

/// Access guard for every protected route.
///
/// A token is only as good as its session row: even a well-signed,
/// unexpired access token is rejected once a newer login has replaced the
/// user's session (single-session-per-user).
pub async fn verify_access(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;
    let claims = auth::verify_access_token(&token)?;
    let user_id = claims.user_id()?;

    let pool = DatabaseManager::pool().await?;
    let session = sessions::find_active(&pool, user_id, claims.session_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("SESSION_INVALIDATED"))?;

    if !session.activo {
        return Err(ApiError::forbidden("USER_INACTIVE"));
    }

    request.extensions_mut().insert(AuthUser {
        id: user_id,
        username: claims.username,
        session_id: claims.session_id,
        full_name: session.nombre_completo,
    });

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("NO_TOKEN"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("NO_TOKEN"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        _ => Err(ApiError::unauthorized("NO_TOKEN")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_no_token() {
        let headers = HeaderMap::new();
        let err = extract_bearer_token(&headers).unwrap_err();
        assert_eq!(err.message(), "NO_TOKEN");
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn non_bearer_scheme_is_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc123"));
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn blank_bearer_token_is_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer ey.token.here"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "ey.token.here");
    }
}
