//! Runtime configuration.
//!
//! Every setting is a command-line flag with a `DINEIN_*` environment
//! fallback. [`Cli::into_config`] validates and produces the [`Config`]
//! the service is wired from.

use crate::application::retry::{Backoff, RetryPolicy};
use crate::error::{Result, ServiceError};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GatewayEnvironment {
    Sandbox,
    Production,
}

impl GatewayEnvironment {
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox.cashfree.com",
            Self::Production => "https://api.cashfree.com",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub client_id: String,
    pub client_secret: String,
    pub environment: GatewayEnvironment,
    pub api_version: String,
    /// Overrides the environment's base URL.
    pub base_url: Option<String>,
    pub verify_webhooks: bool,
}

impl GatewayConfig {
    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            environment: GatewayEnvironment::Sandbox,
            api_version: "2023-08-01".to_string(),
            base_url: None,
            verify_webhooks: false,
        }
    }
}

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub table_count: u32,
    pub default_duration_minutes: u32,
    pub retry: RetryPolicy,
    pub gateway: GatewayConfig,
    pub listen: SocketAddr,
    pub db_path: Option<PathBuf>,
    /// Events a subscriber may have queued before new ones are dropped.
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_count: 10,
            default_duration_minutes: 60,
            retry: RetryPolicy::default(),
            gateway: GatewayConfig::default(),
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_path: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.table_count == 0 {
            return Err(ServiceError::Config(
                "table count must be at least 1".to_string(),
            ));
        }
        if self.default_duration_minutes == 0 {
            return Err(ServiceError::Config(
                "default booking duration must be at least 1 minute".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ServiceError::Config(
                "retry attempts must be at least 1".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ServiceError::Config(
                "channel capacity must be at least 1".to_string(),
            ));
        }
        if self.gateway.verify_webhooks && self.gateway.client_secret.is_empty() {
            return Err(ServiceError::Config(
                "webhook verification needs a gateway client secret".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Dine-in table, order and payment service", long_about = None)]
pub struct Cli {
    /// Address to serve the HTTP API on
    #[arg(long, env = "DINEIN_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Number of tables in the restaurant
    #[arg(long, env = "DINEIN_TABLE_COUNT", default_value_t = 10)]
    pub table_count: u32,

    /// Booking length when a request does not specify one
    #[arg(long, env = "DINEIN_DEFAULT_DURATION_MINUTES", default_value_t = 60)]
    pub default_duration_minutes: u32,

    /// Gateway attempts per operation, including the first
    #[arg(long, env = "DINEIN_RETRY_ATTEMPTS", default_value_t = 3)]
    pub retry_attempts: u32,

    /// Delay between gateway attempts
    #[arg(long, env = "DINEIN_RETRY_DELAY_MS", default_value_t = 1000)]
    pub retry_delay_ms: u64,

    #[arg(long, env = "DINEIN_RETRY_BACKOFF", value_enum, default_value = "fixed")]
    pub retry_backoff: BackoffKind,

    /// Hard timeout for a single gateway attempt
    #[arg(long, env = "DINEIN_GATEWAY_TIMEOUT_MS", default_value_t = 5000)]
    pub gateway_timeout_ms: u64,

    #[arg(long, env = "DINEIN_GATEWAY_CLIENT_ID", default_value = "")]
    pub gateway_client_id: String,

    #[arg(long, env = "DINEIN_GATEWAY_CLIENT_SECRET", default_value = "", hide_env_values = true)]
    pub gateway_client_secret: String,

    #[arg(long, env = "DINEIN_GATEWAY_ENV", value_enum, default_value = "sandbox")]
    pub gateway_env: GatewayEnvironment,

    #[arg(long, env = "DINEIN_GATEWAY_API_VERSION", default_value = "2023-08-01")]
    pub gateway_api_version: String,

    /// Overrides the gateway base URL (for tests and proxies)
    #[arg(long, env = "DINEIN_GATEWAY_URL")]
    pub gateway_url: Option<String>,

    /// Reject webhooks whose signature does not verify
    #[arg(long, env = "DINEIN_VERIFY_WEBHOOKS")]
    pub verify_webhooks: bool,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "DINEIN_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Queued events per websocket subscriber before delivery to it is dropped
    #[arg(long, env = "DINEIN_CHANNEL_CAPACITY", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,
}

impl Cli {
    pub fn into_config(self) -> Result<Config> {
        let delay = Duration::from_millis(self.retry_delay_ms);
        let backoff = match self.retry_backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential {
                max_delay: delay.saturating_mul(8),
            },
        };
        let config = Config {
            table_count: self.table_count,
            default_duration_minutes: self.default_duration_minutes,
            retry: RetryPolicy {
                max_attempts: self.retry_attempts,
                delay,
                attempt_timeout: Duration::from_millis(self.gateway_timeout_ms),
                backoff,
            },
            gateway: GatewayConfig {
                client_id: self.gateway_client_id,
                client_secret: self.gateway_client_secret,
                environment: self.gateway_env,
                api_version: self.gateway_api_version,
                base_url: self.gateway_url,
                verify_webhooks: self.verify_webhooks,
            },
            listen: self.listen,
            db_path: self.db_path,
            channel_capacity: self.channel_capacity,
        };
        config.validate()?;
        Ok(config)
    }
}
