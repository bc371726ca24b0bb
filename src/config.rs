//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Token secret used when none is configured. Rejected in production.
const DEVELOPMENT_TOKEN_SECRET: &str = "bankdesk-development-token-secret-change-me";

/// Minimum token secret length accepted in production
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Token and session lifetimes are capped at one year
const MAX_TTL_HOURS: i64 = 8760;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// HMAC key for customer bearer tokens
    pub token_secret: String,

    /// Bearer token lifetime in hours
    pub token_ttl_hours: i64,

    /// Admin session lifetime in hours
    pub admin_session_ttl_hours: i64,

    /// Per-customer daily outgoing transfer limit
    pub daily_transfer_limit: Decimal,

    /// Currency assigned to customers that don't specify one
    pub default_currency: String,

    /// Bootstrap admin credentials, created at startup when absent
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,

    /// Period of the expired-session purge job
    pub session_cleanup_interval_secs: u64,

    /// Emit JSON logs instead of plain text
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            database_max_connections: 10,
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: "development".to_string(),
            token_secret: DEVELOPMENT_TOKEN_SECRET.to_string(),
            token_ttl_hours: 24,
            admin_session_ttl_hours: 8,
            daily_transfer_limit: Decimal::new(10_000_00, 2),
            default_currency: "USD".to_string(),
            admin_username: None,
            admin_password: None,
            session_cleanup_interval_secs: 300,
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections =
            parse_or("DATABASE_MAX_CONNECTIONS", defaults.database_max_connections)?;

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = parse_or("PORT", defaults.port)?;
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);

        let token_secret = env::var("TOKEN_SECRET").unwrap_or(defaults.token_secret);
        let token_ttl_hours = parse_or("TOKEN_TTL_HOURS", defaults.token_ttl_hours)?;
        let admin_session_ttl_hours =
            parse_or("ADMIN_SESSION_TTL_HOURS", defaults.admin_session_ttl_hours)?;
        let daily_transfer_limit =
            parse_or("DAILY_TRANSFER_LIMIT", defaults.daily_transfer_limit)?;

        let default_currency = env::var("DEFAULT_CURRENCY")
            .map(|c| c.to_uppercase())
            .unwrap_or(defaults.default_currency);

        let admin_username = env::var("ADMIN_USERNAME").ok().filter(|s| !s.is_empty());
        let admin_password = env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty());

        let session_cleanup_interval_secs = parse_or(
            "SESSION_CLEANUP_INTERVAL_SECS",
            defaults.session_cleanup_interval_secs,
        )?;

        let log_json = env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config = Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            token_secret,
            token_ttl_hours,
            admin_session_ttl_hours,
            daily_transfer_limit,
            default_currency,
            admin_username,
            admin_password,
            session_cleanup_interval_secs,
            log_json,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(ConfigError::InvalidValue("TOKEN_TTL_HOURS"));
        }
        if !(1..=MAX_TTL_HOURS).contains(&self.admin_session_ttl_hours) {
            return Err(ConfigError::InvalidValue("ADMIN_SESSION_TTL_HOURS"));
        }
        if self.daily_transfer_limit <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue("DAILY_TRANSFER_LIMIT"));
        }
        if self.default_currency.len() != 3
            || !self.default_currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ConfigError::InvalidValue("DEFAULT_CURRENCY"));
        }
        if self.is_production()
            && (self.token_secret == DEVELOPMENT_TOKEN_SECRET
                || self.token_secret.len() < MIN_PRODUCTION_SECRET_LEN)
        {
            return Err(ConfigError::WeakSecret);
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("TOKEN_SECRET must be set to at least 32 bytes in production")]
    WeakSecret,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(!config.is_production());
        assert_eq!(config.daily_transfer_limit.to_string(), "10000.00");
    }

    #[test]
    fn test_production_rejects_default_secret() {
        let config = Config {
            environment: "production".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::WeakSecret)));

        let config = Config {
            environment: "production".to_string(),
            token_secret: "x".repeat(48),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_currency_rejected() {
        let config = Config {
            default_currency: "US".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue("DEFAULT_CURRENCY"))
        ));
    }

    #[test]
    fn test_ttl_bounds() {
        let config = Config {
            token_ttl_hours: MAX_TTL_HOURS,
            admin_session_ttl_hours: 1,
            ..Config::default()
        };
        assert!(config.validate().is_ok());

        for hours in [0, MAX_TTL_HOURS + 1, i64::MAX] {
            let config = Config {
                token_ttl_hours: hours,
                ..Config::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue("TOKEN_TTL_HOURS"))
            ));

            let config = Config {
                admin_session_ttl_hours: hours,
                ..Config::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue("ADMIN_SESSION_TTL_HOURS"))
            ));
        }
    }
}
