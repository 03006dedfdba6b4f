/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration.
 *
 * # Configuration Sources
 *
 * Configuration is loaded from environment variables (after `.env` is
 * applied by `main`), with defaults suitable for local development. Tests
 * and embedders use `ServerConfig::builder()` instead.
 *
 * | Variable | Default |
 * |---|---|
 * | `SERVER_HOST` | `0.0.0.0` |
 * | `SERVER_PORT` | `3000` |
 * | `JWT_SECRET` | development secret (warns) |
 * | `TOKEN_TTL_SECS` | 30 days (at most one year) |
 * | `BCRYPT_COST` | `bcrypt::DEFAULT_COST` |
 * | `BROKER_URL` | unset: in-process broker |
 * | `BROKER_CHANNEL` | `project-events` |
 * | `CONNECTION_BUFFER` | `64` |
 */

use std::net::SocketAddr;
use thiserror::Error;

use crate::backend::sync::broker::DEFAULT_CHANNEL;

const DEV_JWT_SECRET: &str = "calsync-development-secret-change-me";
const DEFAULT_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;
const DEFAULT_CONNECTION_BUFFER: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub bcrypt_cost: u32,
    /// `None` selects the in-process broker
    pub broker_url: Option<String>,
    pub broker_channel: String,
    /// Outbound records buffered per live connection before it is evicted
    pub connection_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            broker_url: None,
            broker_channel: DEFAULT_CHANNEL.to_string(),
            connection_buffer: DEFAULT_CONNECTION_BUFFER,
        }
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("SERVER_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            config.port = parse("SERVER_PORT", port)?;
        }
        match lookup("JWT_SECRET") {
            Some(secret) => config.jwt_secret = secret,
            None => tracing::warn!("[Config] JWT_SECRET not set, using the development secret"),
        }
        if let Some(ttl) = lookup("TOKEN_TTL_SECS") {
            config.token_ttl_secs = parse("TOKEN_TTL_SECS", ttl)?;
        }
        if let Some(cost) = lookup("BCRYPT_COST") {
            config.bcrypt_cost = parse("BCRYPT_COST", cost)?;
        }
        config.broker_url = lookup("BROKER_URL").filter(|url| !url.trim().is_empty());
        if let Some(channel) = lookup("BROKER_CHANNEL") {
            config.broker_channel = channel;
        }
        if let Some(buffer) = lookup("CONNECTION_BUFFER") {
            config.connection_buffer = parse("CONNECTION_BUFFER", buffer)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid(format!(
                "bcrypt cost must be between 4 and 31, got {}",
                self.bcrypt_cost
            )));
        }
        if self.token_ttl_secs == 0 || self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "token TTL must be between 1 and {} seconds, got {}",
                MAX_TOKEN_TTL_SECS, self.token_ttl_secs
            )));
        }
        if self.connection_buffer == 0 {
            return Err(ConfigError::Invalid("connection buffer must be greater than 0".to_string()));
        }
        if self.broker_channel.trim().is_empty() {
            return Err(ConfigError::Invalid("broker channel cannot be empty".to_string()));
        }
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("JWT secret cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "SERVER_HOST",
                value: self.host.clone(),
            })
    }
}

#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    pub fn token_ttl_secs(mut self, ttl: u64) -> Self {
        self.config.token_ttl_secs = ttl;
        self
    }

    pub fn bcrypt_cost(mut self, cost: u32) -> Self {
        self.config.bcrypt_cost = cost;
        self
    }

    pub fn broker_url(mut self, url: impl Into<String>) -> Self {
        self.config.broker_url = Some(url.into());
        self
    }

    pub fn broker_channel(mut self, channel: impl Into<String>) -> Self {
        self.config.broker_channel = channel.into();
        self
    }

    pub fn connection_buffer(mut self, buffer: usize) -> Self {
        self.config.connection_buffer = buffer;
        self
    }

    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
