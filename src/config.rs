use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

/// Signing secrets shorter than this are rejected at startup.
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_secs: i64,
    pub auth_rps: u32,
    pub cors_allowed_origin: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            server_address: lookup("SERVER_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            database_url: required(&lookup, "DATABASE_URL")?,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret: required(&lookup, "JWT_SECRET")?,
            jwt_expiration_secs: parse_or(&lookup, "JWT_EXPIRATION_SECS", 3600)?,
            auth_rps: parse_or(&lookup, "AUTH_RPS", 20)?,
            cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN").filter(|v| !v.trim().is_empty()),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                None | Some("pretty") => LogFormat::Pretty,
                Some("json") => LogFormat::Json,
                Some(other) => {
                    return Err(Error::Config(format!(
                        "Invalid value for LOG_FORMAT: {}",
                        other
                    )))
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.jwt_secret.chars().count() < MIN_JWT_SECRET_LEN {
            return Err(Error::Config(format!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            )));
        }
        if self.jwt_expiration_secs <= 0 {
            return Err(Error::Config(
                "JWT_EXPIRATION_SECS must be greater than zero".to_string(),
            ));
        }
        if self.database_max_connections == 0 {
            return Err(Error::Config(
                "DATABASE_MAX_CONNECTIONS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn jwt_expiration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.jwt_expiration_secs)
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).ok_or_else(|| Error::Config(format!("Missing environment variable: {}", name)))
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
    }
}
