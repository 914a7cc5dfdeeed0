//! Password hashing and verification on the blocking thread pool.

use bcrypt::{hash, verify};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("hashing error: {0}")]
    Hashing(String),

    #[error("task join error: {0}")]
    Join(String),
}

/// Hash a password with bcrypt. Runs on spawn_blocking since bcrypt is
/// CPU-bound and would stall the async runtime otherwise.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        hash(password, cost).map_err(|e| PasswordError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| PasswordError::Join(e.to_string()))?
}

/// Verify a password against a stored bcrypt hash.
pub async fn verify_password(password: &str, hashed: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let hashed = hashed.to_string();
    tokio::task::spawn_blocking(move || {
        verify(password, &hashed).map_err(|e| PasswordError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| PasswordError::Join(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cost 4 is the bcrypt minimum; fine for tests, too weak for production
    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn hash_then_verify_accepts_correct_password() {
        let hashed = hash_password("s3creta!", TEST_COST).await.unwrap();
        assert!(verify_password("s3creta!", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn verify_rejects_wrong_password() {
        let hashed = hash_password("s3creta!", TEST_COST).await.unwrap();
        assert!(!verify_password("otra-clave", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn verify_errors_on_malformed_hash() {
        assert!(verify_password("x", "not-a-bcrypt-hash").await.is_err());
    }
}
