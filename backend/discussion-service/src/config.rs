/// Configuration management for Discussion Service
///
/// This module handles loading and managing configuration from environment variables.
/// A `.env` file is honoured by `main` before `Config::from_env` runs.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Configuration loading failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("failed to parse {key}='{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("{0}")]
    Unsafe(String),
}

/// Main application configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Discourse forum configuration
    pub discourse: DiscourseConfig,
    /// Sibling platform services
    pub services: ServicesConfig,
    /// Kafka configuration
    pub kafka: KafkaConfig,
    /// JWT validation
    pub jwt: JwtConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Actix worker count
    pub workers: usize,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Discourse forum configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DiscourseConfig {
    /// Base URL of the Discourse instance
    pub host: String,
    /// Admin API key
    pub api_key: String,
    /// Username used for non-impersonated calls
    pub system_username: String,
    /// Verify the TLS certificate of the Discourse host
    pub ssl_check: bool,
    /// Domain of the synthetic e-mail given to forum accounts
    pub user_email_domain: String,
    pub request_timeout_ms: u64,
}

/// Asset-management and auth service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub asset_management_url: String,
    pub auth_url: String,
    pub request_timeout_ms: u64,
}

/// Kafka configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    /// Kafka brokers
    pub brokers: Vec<String>,
    /// Topic consumed by the auto-moderation pipeline
    pub moderation_topic: String,
    /// Topic consumed by the notification service
    pub notification_topic: String,
    pub request_timeout_ms: u64,
}

/// JWT validation configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct JwtConfig {
    /// RSA public key (PEM) used to verify RS256 access tokens
    pub public_key_pem: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app", &self.app)
            .field("cors", &self.cors)
            .field("database", &self.database)
            .field("discourse", &self.discourse)
            .field("services", &self.services)
            .field("kafka", &self.kafka)
            .field("jwt", &self.jwt)
            .finish()
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

impl fmt::Debug for DiscourseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscourseConfig")
            .field("host", &self.host)
            .field("api_key", &"[REDACTED]")
            .field("system_username", &self.system_username)
            .field("ssl_check", &self.ssl_check)
            .field("user_email_domain", &self.user_email_domain)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("public_key_pem", &self.public_key_pem.as_ref().map(|_| "[SET]"))
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let app = AppConfig {
            env: app_env,
            host: lookup("DISCUSSION_SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or_default(&lookup, "DISCUSSION_SERVICE_PORT", 8090)?,
            workers: parse_or_default(&lookup, "DISCUSSION_SERVICE_WORKERS", 4)?,
        };

        let cors = {
            let allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
                Some(value) => value,
                None if production => return Err(ConfigError::Missing("CORS_ALLOWED_ORIGINS")),
                None => "http://localhost:3000".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err(ConfigError::Unsafe(
                    "CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string(),
                ));
            }

            CorsConfig { allowed_origins }
        };

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "postgresql://localhost/discussion".to_string()),
            max_connections: parse_or_default(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            min_connections: parse_or_default(&lookup, "DATABASE_MIN_CONNECTIONS", 1)?,
            acquire_timeout_secs: parse_or_default(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 10)?,
        };

        let discourse = DiscourseConfig {
            host: required(&lookup, "DISCOURSE_HOST")?
                .trim_end_matches('/')
                .to_string(),
            api_key: required(&lookup, "DISCOURSE_API_KEY")?,
            system_username: lookup("DISCOURSE_SYSTEM_USERNAME")
                .unwrap_or_else(|| "system".to_string()),
            ssl_check: parse_or_default(&lookup, "DISCOURSE_SSL_CHECK", true)?,
            user_email_domain: lookup("DISCOURSE_USER_EMAIL_DOMAIN")
                .unwrap_or_else(|| "eu.space".to_string()),
            request_timeout_ms: parse_or_default(&lookup, "DISCOURSE_REQUEST_TIMEOUT_MS", 10_000)?,
        };

        if production && !discourse.ssl_check {
            tracing::warn!("DISCOURSE_SSL_CHECK is disabled in production");
        }

        let services = ServicesConfig {
            asset_management_url: lookup("ASSET_MANAGEMENT_URL")
                .unwrap_or_else(|| "http://asset-management:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            auth_url: lookup("AUTH_SERVICE_URL")
                .unwrap_or_else(|| "http://auth:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            request_timeout_ms: parse_or_default(&lookup, "SERVICE_REQUEST_TIMEOUT_MS", 5_000)?,
        };

        let kafka = KafkaConfig {
            brokers: lookup("KAFKA_BROKERS")
                .unwrap_or_else(|| "localhost:9092".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            moderation_topic: lookup("KAFKA_MODERATION_TOPIC")
                .unwrap_or_else(|| "moderation.auto.text-toxicity".to_string()),
            notification_topic: lookup("KAFKA_NOTIFICATION_TOPIC")
                .unwrap_or_else(|| "notification.email".to_string()),
            request_timeout_ms: parse_or_default(&lookup, "KAFKA_REQUEST_TIMEOUT_MS", 5_000)?,
        };

        let jwt = JwtConfig {
            public_key_pem: lookup("JWT_PUBLIC_KEY_PEM").filter(|v| !v.trim().is_empty()),
        };

        Ok(Config {
            app,
            cors,
            database,
            discourse,
            services,
            kafka,
            jwt,
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
