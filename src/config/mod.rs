use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Secret used to sign access tokens. Comes from JWT_SECRET.
    pub jwt_secret: String,
    /// Secret used to sign refresh tokens. Comes from REFRESH_SECRET.
    pub refresh_secret: String,
    pub access_expiry_minutes: i64,
    pub refresh_expiry_days: i64,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment defaults first, then specific env vars on top
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("CORS_ORIGIN") {
            self.server.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }

        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("REFRESH_SECRET") {
            self.security.refresh_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRES_MINUTES") {
            self.security.access_expiry_minutes =
                v.parse().unwrap_or(self.security.access_expiry_minutes);
        }
        if let Ok(v) = env::var("REFRESH_EXPIRES_DAYS") {
            self.security.refresh_expiry_days =
                v.parse().unwrap_or(self.security.refresh_expiry_days);
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8080,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            database: DatabaseConfig { max_connections: 10, connection_timeout_secs: 30 },
            security: SecurityConfig {
                jwt_secret: String::new(),
                refresh_secret: String::new(),
                access_expiry_minutes: 15,
                refresh_expiry_days: 30,
                bcrypt_cost: 10,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 8080, cors_origins: vec![] },
            database: DatabaseConfig { max_connections: 20, connection_timeout_secs: 10 },
            security: SecurityConfig {
                jwt_secret: String::new(),
                refresh_secret: String::new(),
                access_expiry_minutes: 15,
                refresh_expiry_days: 30,
                bcrypt_cost: 10,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 8080, cors_origins: vec![] },
            database: DatabaseConfig { max_connections: 20, connection_timeout_secs: 5 },
            security: SecurityConfig {
                jwt_secret: String::new(),
                refresh_secret: String::new(),
                access_expiry_minutes: 15,
                refresh_expiry_days: 30,
                bcrypt_cost: 12,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.security.access_expiry_minutes, 15);
        assert_eq!(config.security.refresh_expiry_days, 30);
        assert_eq!(config.security.bcrypt_cost, 10);
    }

    #[test]
    fn production_uses_higher_bcrypt_cost() {
        let config = AppConfig::production();
        assert_eq!(config.security.bcrypt_cost, 12);
        assert!(config.server.cors_origins.is_empty());
    }
}
