use std::{env, fmt::Display, ops::RangeInclusive, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

const DEV_TOKEN_SECRET: &str = "shopit-development-secret";

const TOKEN_EXPIRES_HOURS: RangeInclusive<i64> = 1..=24 * 365;
const COOKIE_EXPIRES_DAYS: RangeInclusive<i64> = 1..=365;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("{0} must be set in production")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub token_secret: String,
    pub token_expires_hours: i64,
    pub cookie_expires_days: i64,
    pub password_iterations: u32,
    pub frontend_url: String,
    pub admin_email: Option<String>,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment: Environment = try_load("APP_ENV", "development")?;

        let token_secret = match env::var("TOKEN_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment == Environment::Production => {
                return Err(ConfigError::Missing("TOKEN_SECRET"));
            }
            _ => {
                warn!("TOKEN_SECRET not set, using the development secret");
                DEV_TOKEN_SECRET.to_string()
            }
        };

        Ok(Self {
            host: try_load("HOST", "127.0.0.1")?,
            port: try_load("PORT", "4000")?,
            database_path: try_load("DATABASE_PATH", "shopit.db")?,
            token_secret,
            token_expires_hours: within(
                "TOKEN_EXPIRES_HOURS",
                try_load("TOKEN_EXPIRES_HOURS", "168")?,
                TOKEN_EXPIRES_HOURS,
            )?,
            cookie_expires_days: within(
                "COOKIE_EXPIRES_DAYS",
                try_load("COOKIE_EXPIRES_DAYS", "7")?,
                COOKIE_EXPIRES_DAYS,
            )?,
            password_iterations: try_load("PASSWORD_ITERATIONS", "100000")?,
            frontend_url: try_load("FRONTEND_URL", "http://localhost:3000")?,
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|e| !e.trim().is_empty()),
            environment,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 4000,
            database_path: ":memory:".into(),
            token_secret: DEV_TOKEN_SECRET.into(),
            token_expires_hours: 168,
            cookie_expires_days: 7,
            password_iterations: 100_000,
            frontend_url: "http://localhost:3000".into(),
            admin_email: None,
            environment: Environment::Development,
        }
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn within(key: &'static str, value: i64, range: RangeInclusive<i64>) -> Result<i64, ConfigError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!(
                "{} is outside {}..={}",
                value,
                range.start(),
                range.end()
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_environment_names() {
        assert_eq!(
            "Production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "dev".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn default_binds_locally() {
        let config = Config::default();
        assert_eq!(config.address(), "127.0.0.1:4000");
        assert_eq!(config.database_path, ":memory:");
    }

    #[test]
    fn expiry_settings_are_bounded() {
        assert_eq!(
            within("TOKEN_EXPIRES_HOURS", 168, TOKEN_EXPIRES_HOURS).unwrap(),
            168
        );
        for bad in [0, -1, 24 * 365 + 1, i64::MAX] {
            assert!(matches!(
                within("TOKEN_EXPIRES_HOURS", bad, TOKEN_EXPIRES_HOURS),
                Err(ConfigError::Invalid { key: "TOKEN_EXPIRES_HOURS", .. })
            ));
        }
        assert!(within("COOKIE_EXPIRES_DAYS", 365, COOKIE_EXPIRES_DAYS).is_ok());
        assert!(within("COOKIE_EXPIRES_DAYS", i64::MIN, COOKIE_EXPIRES_DAYS).is_err());

        let defaults = Config::default();
        assert!(TOKEN_EXPIRES_HOURS.contains(&defaults.token_expires_hours));
        assert!(COOKIE_EXPIRES_DAYS.contains(&defaults.cookie_expires_days));
    }
}
