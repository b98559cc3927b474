//! API server configuration.
//!
//! Loaded from environment variables with development defaults. The JWT
//! secret default exists only so a bare `cargo run` works on a laptop; a
//! deployment must set `CAJA_JWT_SECRET`.

use serde::{Deserialize, Serialize};
use std::env;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port.
    pub port: u16,

    /// Path to the SQLite database file.
    pub database_path: String,

    /// JWT signing secret.
    pub jwt_secret: String,

    /// Access-token lifetime in seconds.
    pub jwt_lifetime_secs: i64,
}

impl ApiConfig {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            port: env::var("CAJA_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CAJA_PORT".to_string()))?,

            database_path: env::var("CAJA_DATABASE_PATH")
                .unwrap_or_else(|_| "caja.db".to_string()),

            jwt_secret: env::var("CAJA_JWT_SECRET")
                .unwrap_or_else(|_| "caja-dev-secret-change-in-production".to_string()),

            jwt_lifetime_secs: env::var("CAJA_JWT_LIFETIME_SECS")
                .unwrap_or_else(|_| "28800".to_string()) // one shift
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CAJA_JWT_LIFETIME_SECS".to_string()))?,
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}")]
    InvalidValue(String),
}
