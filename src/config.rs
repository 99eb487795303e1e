use chrono::{Duration, Utc};
use std::env;
use std::fmt;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` runs the service on the in-memory stores.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_port: u16,
    pub server_host: String,
    /// Allowed CORS origin. `None` allows any origin.
    pub cors_origin: Option<String>,
}

/// Startup misconfiguration. Never produced while serving requests.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has an invalid value: {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so it can be
    /// exercised without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = non_empty("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiration_hours = match non_empty("JWT_EXPIRATION_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| token_lifetime_fits(*hours))
                .ok_or(ConfigError::Invalid {
                    key: "JWT_EXPIRATION_HOURS",
                    value: raw,
                })?,
            None => 24,
        };

        let server_port = match non_empty("SERVER_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "SERVER_PORT",
                value: raw,
            })?,
            None => 5000,
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            jwt_secret,
            jwt_expiration_hours,
            server_port,
            server_host: non_empty("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            cors_origin: non_empty("CORS_ORIGIN"),
        })
    }

    /// Lifetime of issued tokens. `jwt_expiration_hours` is range-checked on load.
    pub fn token_ttl(&self) -> Duration {
        Duration::try_hours(self.jwt_expiration_hours).unwrap_or_else(|| Duration::hours(24))
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

/// Positive, and small enough that a token issued now still gets a representable expiry.
fn token_lifetime_fits(hours: i64) -> bool {
    hours > 0
        && Duration::try_hours(hours)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .is_some()
}
