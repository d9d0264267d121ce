// Centralized configuration management
// Load ALL env vars ONCE at startup

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Global application configuration loaded once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    // For tests, load .env file first
    #[cfg(test)]
    dotenv::dotenv().ok();

    AppConfig::from_env().expect("Failed to load configuration")
});

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    // Server
    pub bind_address: String,
    pub port: u16,
    pub environment: Environment,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    pub database_connect_timeout: u64,
    pub database_idle_timeout: u64,
    pub database_max_lifetime: u64,

    // JWT
    pub jwt_access_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,

    // External order gateway
    pub convomat: ConvomatConfig,

    // Notification delivery
    pub email: EmailConfig,

    // Features
    pub disable_embedded_migrations: bool,
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// External order gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvomatConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

/// Notification delivery configuration (Resend-compatible HTTP API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
    pub reply_to: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: env_or("BIND_ADDRESS", "0.0.0.0"),
            port: env_parse("PORT", 8080)?,
            environment: Environment::from(env_or("ENVIRONMENT", "development")),

            database_url: env_required("DATABASE_URL")?,
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10)?,
            database_min_connections: env_parse("DATABASE_MIN_CONNECTIONS", 1)?,
            database_connect_timeout: env_parse("DATABASE_CONNECT_TIMEOUT", 30)?,
            database_idle_timeout: env_parse("DATABASE_IDLE_TIMEOUT", 600)?,
            database_max_lifetime: env_parse("DATABASE_MAX_LIFETIME", 1800)?,

            jwt_access_secret: env_required("JWT_ACCESS_SECRET")?,
            jwt_audience: env_or("JWT_AUDIENCE", "revly-api"),
            jwt_issuer: env_or("JWT_ISSUER", "revly"),

            convomat: ConvomatConfig {
                api_url: env_or("CONVOMAT_API_URL", "https://api.convomat.com/v1"),
                api_key: env_required("CONVOMAT_API_KEY")?,
                timeout_seconds: env_parse("CONVOMAT_TIMEOUT_SECONDS", 30)?,
            },

            email: EmailConfig {
                api_url: env_or("RESEND_API_URL", "https://api.resend.com/emails"),
                api_key: env_or("RESEND_API_KEY", ""),
                from_address: env_or("EMAIL_FROM_ADDRESS", "no-reply@revly.app"),
                reply_to: env::var("EMAIL_REPLY_TO").ok(),
            },

            disable_embedded_migrations: env_parse("DISABLE_EMBEDDED_MIGRATIONS", false)?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))
}

fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

/// Accessor used across the codebase instead of touching CONFIG directly
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_known_aliases() {
        assert_eq!(
            Environment::from("prod".to_string()),
            Environment::Production
        );
        assert_eq!(Environment::from("dev".to_string()), Environment::Development);
        assert_eq!(Environment::from("weird".to_string()), Environment::Development);
    }

    #[test]
    fn environment_display_round_trips() {
        for env in [
            Environment::Development,
            Environment::Test,
            Environment::Staging,
            Environment::Production,
        ] {
            assert_eq!(Environment::from(env.to_string()), env);
        }
    }
}
