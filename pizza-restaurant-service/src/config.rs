use std::{env, net::SocketAddr};

use dotenvy::dotenv;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "app.db";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5555";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_POOL_SIZE: u32 = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub bind_address: SocketAddr,
    pub log_level: String,
    pub pool_size: u32,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // DB_URI is the older name for the same setting.
        let database_url = lookup("DATABASE_URL")
            .or_else(|| lookup("DB_URI"))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let bind_address = lookup("BIND_ADDRESS")
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let bind_address = bind_address
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDRESS",
                value: bind_address.clone(),
            })?;

        let pool_size = match lookup("DB_POOL_SIZE") {
            None => DEFAULT_POOL_SIZE,
            Some(value) => match value.parse::<u32>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DB_POOL_SIZE",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            database_url,
            bind_address,
            log_level,
            pool_size,
        })
    }
}
