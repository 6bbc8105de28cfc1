//! Configuration for pvz-service.

use secrecy::Secret;
use service_core::config::Config as CommonConfig;
use service_core::error::AppError;
use std::env;

/// Pvz service configuration.
#[derive(Debug, Clone)]
pub struct PvzConfig {
    pub common: CommonConfig,
    pub service_name: String,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub grpc_port: u16,
    pub jwt: JwtConfig,
    pub request_timeout_secs: u64,
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Token signing configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub expiry_minutes: i64,
}

impl PvzConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let common = CommonConfig::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(PvzConfig {
            common,
            service_name: "pvz-service".to_string(),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            database: DatabaseConfig {
                url: get_env("PVZ_DATABASE_URL", None, is_prod)?,
                max_connections: parse_env("PVZ_DB_MAX_CONNECTIONS", 10)?,
                min_connections: parse_env("PVZ_DB_MIN_CONNECTIONS", 1)?,
            },
            grpc_port: parse_env("PVZ_GRPC_PORT", 3000)?,
            jwt: JwtConfig {
                secret: Secret::new(get_env("PVZ_JWT_SECRET", Some("dev-secret"), is_prod)?),
                expiry_minutes: parse_env("PVZ_JWT_EXPIRY_MINUTES", 720)?,
            },
            request_timeout_secs: parse_env("PVZ_REQUEST_TIMEOUT_SECS", 10)?,
        })
    }
}

/// Read a variable; production requires it to be set explicitly.
fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Parse a numeric variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value '{}': {}", key, val, e))
        }),
        Err(_) => Ok(default),
    }
}
