pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

/// Claims carried by both access and refresh tokens. The session id binds a
/// token to the single persisted session row for the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringified integer
    pub sub: String,
    pub username: String,
    pub session_id: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i32, username: String, session_id: Uuid, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            username,
            session_id,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Parse the subject back into the numeric user id
    pub fn user_id(&self) -> Result<i32, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Invalid(format!("non-numeric subject: {}", self.sub)))
    }
}

#[derive(Debug)]
pub enum TokenError {
    Expired,
    Invalid(String),
    MissingSecret,
    Generation(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token expired"),
            TokenError::Invalid(msg) => write!(f, "invalid token: {}", msg),
            TokenError::MissingSecret => write!(f, "JWT secret not configured"),
            TokenError::Generation(msg) => write!(f, "token generation error: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

fn sign(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| TokenError::Generation(e.to_string()))
}

fn verify(token: &str, secret: &str) -> Result<Claims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })?;
    Ok(data.claims)
}

/// Sign a short-lived access token for the given user/session
pub fn sign_access_token(user_id: i32, username: &str, session_id: Uuid) -> Result<String, TokenError> {
    let security = &config::config().security;
    let claims = Claims::new(
        user_id,
        username.to_string(),
        session_id,
        Duration::minutes(security.access_expiry_minutes),
    );
    sign(&claims, &security.jwt_secret)
}

/// Sign a long-lived refresh token for the given user/session
pub fn sign_refresh_token(user_id: i32, username: &str, session_id: Uuid) -> Result<String, TokenError> {
    let security = &config::config().security;
    let claims = Claims::new(
        user_id,
        username.to_string(),
        session_id,
        Duration::days(security.refresh_expiry_days),
    );
    sign(&claims, &security.refresh_secret)
}

/// Validate an access token signature and expiry
pub fn verify_access_token(token: &str) -> Result<Claims, TokenError> {
    verify(token, &config::config().security.jwt_secret)
}

/// Validate a refresh token signature and expiry
pub fn verify_refresh_token(token: &str) -> Result<Claims, TokenError> {
    verify(token, &config::config().security.refresh_secret)
}
