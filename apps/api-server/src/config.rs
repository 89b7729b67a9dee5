//! Application configuration loaded from environment variables.

use std::env;

use quill_infra::JwtConfig;
use quill_infra::database::DatabaseConfig;

#[cfg(feature = "rate-limit")]
use quill_infra::RateLimitConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub run_migrations: bool,
    pub jwt: JwtConfig,
    /// Key rate limits on `Forwarded`/`X-Forwarded-For` instead of the socket peer.
    pub trust_forwarded_for: bool,
    #[cfg(feature = "rate-limit")]
    pub auth_rate_limit: RateLimitConfig,
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let defaults = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: parsed("DB_MAX_CONNECTIONS").unwrap_or(defaults.max_connections),
                min_connections: parsed("DB_MIN_CONNECTIONS").unwrap_or(defaults.min_connections),
                ..defaults
            }
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT").unwrap_or(5000),
            database,
            run_migrations: flag("RUN_MIGRATIONS"),
            jwt: JwtConfig::from_env(),
            trust_forwarded_for: flag("TRUST_FORWARDED_FOR"),
            #[cfg(feature = "rate-limit")]
            auth_rate_limit: RateLimitConfig::from_env(),
        }
    }
}
